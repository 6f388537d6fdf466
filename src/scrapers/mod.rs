//! News sources the digest collects from.
//!
//! Every source implements [`NewsSource`] and turns one remote listing into
//! [`RawArticle`]s. Sources never see each other; the pipeline fans out over
//! the registry and keeps whatever comes back.
//!
//! # Registered sources
//!
//! | Source | Module | Method | Category |
//! |--------|--------|--------|----------|
//! | 네이버 | [`naver`] | HTML scraping of the ranking page | domestic |
//! | 구글뉴스 | [`feed`] | RSS, publisher suffix stripped | domestic |
//! | 연합뉴스 (SBS fallback) | [`feed`] | RSS | domestic |
//! | 시사IN (프레시안 fallback) | [`feed`] | RSS, links validated | analysis |
//! | BBC | [`feed`] | RSS | global |
//! | CNN | [`feed`] | RSS | global |
//! | 전자신문 | [`feed`] | RSS | tech |
//! | 매일경제 | [`feed`] | RSS | economy |

pub mod feed;
pub mod naver;

use crate::models::{Category, RawArticle};
use crate::retry::{retry_when, Backoff};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::error::Error;
use std::time::Duration;

pub use feed::RssSource;
pub use naver::NaverRanking;

/// Error type shared by all fetchers.
pub type FetchError = Box<dyn Error + Send + Sync>;

const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; news_digest/0.1; +https://github.com/news-digest)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A remote listing of headlines.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Registered name, used for failure reports.
    fn name(&self) -> &str;

    /// Category every article from this source is filed under.
    fn category(&self) -> Category;

    /// Download and parse the listing.
    async fn fetch(&self, client: &Client) -> Result<Vec<RawArticle>, FetchError>;
}

/// HTTP client shared by every source.
pub fn http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// Whether a failed request is worth repeating: no response at all, a
/// server error or rate limiting. Other client errors are final.
fn is_transient_status(status: Option<StatusCode>) -> bool {
    match status {
        None => true,
        Some(status) => status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    is_transient_status(err.status())
}

/// GET `url` and return the body, retrying transient failures.
pub(crate) async fn fetch_body(client: &Client, url: &str) -> Result<Vec<u8>, reqwest::Error> {
    retry_when(
        url,
        &Backoff::FETCH,
        || async move {
            let response = client.get(url).send().await?.error_for_status()?;
            Ok(response.bytes().await?.to_vec())
        },
        is_transient,
    )
    .await
}

/// GET `url` as text, decoded with the charset the server declares.
pub(crate) async fn fetch_text(client: &Client, url: &str) -> Result<String, reqwest::Error> {
    retry_when(
        url,
        &Backoff::FETCH,
        || async move { client.get(url).send().await?.error_for_status()?.text().await },
        is_transient,
    )
    .await
}

/// The sources a daily digest is built from, in collection order.
pub fn default_sources() -> Vec<Box<dyn NewsSource>> {
    vec![
        Box::new(NaverRanking::new(
            "https://news.naver.com/main/ranking/popularDay.naver",
        )),
        Box::new(
            RssSource::new(
                "구글뉴스",
                Category::Domestic,
                "https://news.google.com/rss?hl=ko&gl=KR&ceid=KR:ko",
                7,
            )
            .strip_title_suffix(),
        ),
        Box::new(
            RssSource::new(
                "연합뉴스",
                Category::Domestic,
                "https://www.yonhapnewstv.co.kr/browse/feed/",
                7,
            )
            .with_fallback(
                "SBS",
                "https://news.sbs.co.kr/news/SectionRssFeed.do?sectionId=01&plink=RSSREADER",
            ),
        ),
        Box::new(
            RssSource::new(
                "시사IN",
                Category::Analysis,
                "https://www.sisain.co.kr/rss/allArticle.xml",
                5,
            )
            .with_fallback("프레시안", "https://www.pressian.com/rss/section/news")
            .validate_links(),
        ),
        Box::new(RssSource::new(
            "BBC",
            Category::Global,
            "http://feeds.bbci.co.uk/news/world/rss.xml",
            5,
        )),
        Box::new(RssSource::new(
            "CNN",
            Category::Global,
            "http://rss.cnn.com/rss/edition_world.rss",
            5,
        )),
        Box::new(RssSource::new(
            "전자신문",
            Category::Tech,
            "https://rss.etnews.com/Section901.xml",
            5,
        )),
        Box::new(RssSource::new(
            "매일경제",
            Category::Economy,
            "https://www.mk.co.kr/rss/30000001/",
            5,
        )),
    ]
}
