//! Naver "most viewed" ranking scraper.
//!
//! The ranking page groups headlines into one box per press outlet. Titles are
//! taken box by box until seven are collected. If the layout yields nothing,
//! a flat pass over every ranking link is tried instead.
//!
//! Links on the page are site-relative and are resolved against
//! `https://news.naver.com`.

use super::{fetch_text, FetchError, NewsSource};
use crate::models::{Category, RawArticle};
use crate::utils::collapse_whitespace;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

pub const SOURCE_NAME: &str = "네이버";
const BASE_URL: &str = "https://news.naver.com";
const MAX_ITEMS: usize = 7;

static BOX: Lazy<Selector> = Lazy::new(|| Selector::parse(".rankingnews_box").unwrap());
static BOX_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse(".rankingnews_list li").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse(".list_title").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static FLAT_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".rankingnews_list li a[href]").unwrap());

/// The ranking page as a source.
#[derive(Debug, Clone)]
pub struct NaverRanking {
    url: String,
}

impl NaverRanking {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl NewsSource for NaverRanking {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn category(&self) -> Category {
        Category::Domestic
    }

    #[instrument(level = "info", skip_all, fields(source = SOURCE_NAME, url = %self.url))]
    async fn fetch(&self, client: &Client) -> Result<Vec<RawArticle>, FetchError> {
        let html = fetch_text(client, &self.url).await?;
        let articles = parse_ranking(&html)?;
        info!(count = articles.len(), "Indexed ranking headlines");
        Ok(articles)
    }
}

/// Extract up to seven ranked headlines from the page.
///
/// Relative links are resolved against the Naver news origin; items whose
/// link cannot be resolved are skipped.
///
/// # Errors
///
/// Returns an error only if the origin URL itself fails to parse.
pub fn parse_ranking(html: &str) -> Result<Vec<RawArticle>, url::ParseError> {
    let base = Url::parse(BASE_URL)?;
    let document = Html::parse_document(html);

    let mut articles: Vec<RawArticle> = document
        .select(&BOX)
        .flat_map(|ranking_box| ranking_box.select(&BOX_ITEM))
        .filter_map(|item| {
            let title = item.select(&TITLE).next().map(text_of)?;
            let href = item.select(&LINK).next()?.value().attr("href")?;
            headline(&base, title, href)
        })
        .take(MAX_ITEMS)
        .collect();

    if articles.is_empty() {
        debug!("Ranking boxes empty; falling back to flat link scan");
        articles = document
            .select(&FLAT_LINK)
            .take(MAX_ITEMS)
            .filter_map(|link| {
                let href = link.value().attr("href")?;
                headline(&base, text_of(link), href)
            })
            .collect();
    }

    Ok(articles)
}

fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn headline(base: &Url, title: String, href: &str) -> Option<RawArticle> {
    if title.is_empty() || href.trim().is_empty() {
        return None;
    }
    let link = base.join(href.trim()).ok()?;
    Some(RawArticle::new(&title, SOURCE_NAME, Category::Domestic).with_url(link.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking_box(press: &str, items: &[(&str, &str)]) -> String {
        let lis: String = items
            .iter()
            .map(|(title, href)| {
                format!(
                    r#"<li><em class="list_ranking_num">1</em><div class="list_content">
                    <a href="{href}" class="list_title nclicks('RBP.rnknws')">{title}</a></div></li>"#
                )
            })
            .collect();
        format!(
            r#"<div class="rankingnews_box"><strong class="rankingnews_name">{press}</strong>
            <ul class="rankingnews_list">{lis}</ul></div>"#
        )
    }

    #[test]
    fn test_parse_ranking_reads_boxes_and_resolves_links() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            ranking_box(
                "연합뉴스",
                &[
                    ("국회 예산안 처리 합의", "/article/001/0014000001"),
                    ("  폭설로   출근길 혼잡 ", "https://n.news.naver.com/article/001/0014000002"),
                ]
            ),
            ranking_box("KBS", &[("환율 1400원 돌파", "/article/056/0011000003")]),
        );

        let articles = parse_ranking(&html).unwrap();
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["국회 예산안 처리 합의", "폭설로 출근길 혼잡", "환율 1400원 돌파"]);
        assert_eq!(articles[0].url, "https://news.naver.com/article/001/0014000001");
        assert_eq!(articles[1].url, "https://n.news.naver.com/article/001/0014000002");
        assert!(articles.iter().all(|a| a.source == "네이버" && a.summary.is_empty()));
        assert!(articles.iter().all(|a| a.category == Category::Domestic));
    }

    #[test]
    fn test_parse_ranking_caps_at_seven() {
        let items: Vec<(String, String)> = (0..5)
            .map(|i| (format!("기사 {i}"), format!("/article/{i}")))
            .collect();
        let refs: Vec<(&str, &str)> = items.iter().map(|(t, h)| (t.as_str(), h.as_str())).collect();
        let html = format!("{}{}", ranking_box("A", &refs), ranking_box("B", &refs));

        assert_eq!(parse_ranking(&html).unwrap().len(), 7);
    }

    #[test]
    fn test_parse_ranking_falls_back_to_flat_links() {
        let html = r#"<ul class="rankingnews_list">
            <li><a href="/article/1">첫 번째 헤드라인</a></li>
            <li><a href="/article/2"></a></li>
            <li><a href="/article/3">세 번째 헤드라인</a></li>
        </ul>"#;

        let articles = parse_ranking(html).unwrap();
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["첫 번째 헤드라인", "세 번째 헤드라인"]);
        assert_eq!(articles[1].url, "https://news.naver.com/article/3");
    }

    #[test]
    fn test_parse_ranking_empty_page() {
        assert!(parse_ranking("<html><body></body></html>").unwrap().is_empty());
    }
}
