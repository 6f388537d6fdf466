//! RSS 2.0 feed source.
//!
//! Most outlets publish a section feed, so one configurable type covers them.
//! Per-feed quirks are opt-in:
//!
//! - `strip_title_suffix`: Google News appends ` - Publisher` to every title
//! - `with_fallback`: a second feed, under its own source name, tried when the
//!   primary one cannot be fetched or parsed
//! - `validate_links`: drop items whose link does not answer a HEAD request

use super::{fetch_body, FetchError, NewsSource};
use crate::models::{Category, RawArticle};
use crate::utils::{collapse_whitespace, truncate_sentence};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const SUMMARY_MAX_CHARS: usize = 200;
const LINK_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

static PUBLISHER_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r" - .*$").unwrap());

#[derive(Debug, Clone)]
struct Feed {
    name: String,
    url: String,
}

/// A source backed by an RSS feed.
#[derive(Debug, Clone)]
pub struct RssSource {
    primary: Feed,
    fallback: Option<Feed>,
    category: Category,
    max_items: usize,
    strip_title_suffix: bool,
    validate_links: bool,
}

impl RssSource {
    pub fn new(name: &str, category: Category, url: &str, max_items: usize) -> Self {
        Self {
            primary: Feed {
                name: name.to_string(),
                url: url.to_string(),
            },
            fallback: None,
            category,
            max_items,
            strip_title_suffix: false,
            validate_links: false,
        }
    }

    /// Remove a trailing ` - Publisher` from titles.
    pub fn strip_title_suffix(mut self) -> Self {
        self.strip_title_suffix = true;
        self
    }

    /// Feed to use, under `name`, when the primary feed fails.
    pub fn with_fallback(mut self, name: &str, url: &str) -> Self {
        self.fallback = Some(Feed {
            name: name.to_string(),
            url: url.to_string(),
        });
        self
    }

    /// Keep only items whose link answers a HEAD request successfully.
    pub fn validate_links(mut self) -> Self {
        self.validate_links = true;
        self
    }

    #[instrument(level = "info", skip_all, fields(source = %feed.name, url = %feed.url))]
    async fn fetch_feed(&self, client: &Client, feed: &Feed) -> Result<Vec<RawArticle>, FetchError> {
        let body = fetch_body(client, &feed.url).await?;
        let articles = parse_feed(
            &body,
            &feed.name,
            self.category,
            self.max_items,
            self.strip_title_suffix,
        )?;
        info!(count = articles.len(), "Parsed feed");
        Ok(articles)
    }
}

#[async_trait]
impl NewsSource for RssSource {
    fn name(&self) -> &str {
        &self.primary.name
    }

    fn category(&self) -> Category {
        self.category
    }

    async fn fetch(&self, client: &Client) -> Result<Vec<RawArticle>, FetchError> {
        let articles = match (self.fetch_feed(client, &self.primary).await, &self.fallback) {
            (Ok(articles), _) => articles,
            (Err(e), Some(fallback)) => {
                warn!(
                    source = %self.primary.name,
                    fallback = %fallback.name,
                    error = %e,
                    "Primary feed failed; trying fallback"
                );
                self.fetch_feed(client, fallback).await?
            }
            (Err(e), None) => return Err(e),
        };

        if !self.validate_links {
            return Ok(articles);
        }
        Ok(keep_reachable(client, articles).await)
    }
}

/// Drop articles whose link is empty or does not answer a HEAD request.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
async fn keep_reachable(client: &Client, articles: Vec<RawArticle>) -> Vec<RawArticle> {
    let checks = articles.iter().map(|article| async move {
        if article.url.is_empty() {
            return false;
        }
        match client
            .head(&article.url)
            .timeout(LINK_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(url = %article.url, status = %response.status(), "Dropping dead link");
                false
            }
            Err(e) => {
                debug!(url = %article.url, error = %e, "Dropping unreachable link");
                false
            }
        }
    });
    let verdicts = join_all(checks).await;

    let kept: Vec<RawArticle> = articles
        .into_iter()
        .zip(verdicts)
        .filter_map(|(article, ok)| ok.then_some(article))
        .collect();
    info!(kept = kept.len(), "Validated links");
    kept
}

/// Parse an RSS document into at most `max_items` articles.
///
/// Items without a title are skipped. Descriptions are reduced to plain text
/// and cut to 200 characters at a sentence end when possible.
///
/// # Errors
///
/// Returns an error if `body` is not a well-formed RSS document.
pub fn parse_feed(
    body: &[u8],
    source: &str,
    category: Category,
    max_items: usize,
    strip_title_suffix: bool,
) -> Result<Vec<RawArticle>, rss::Error> {
    let channel = rss::Channel::read_from(body)?;

    let articles = channel
        .items()
        .iter()
        .take(max_items)
        .filter_map(|item| {
            let mut title = collapse_whitespace(item.title()?);
            if strip_title_suffix {
                title = PUBLISHER_SUFFIX.replace(&title, "").trim().to_string();
            }
            if title.is_empty() {
                return None;
            }

            let summary = item
                .description()
                .map(|d| truncate_sentence(&plain_text(d), SUMMARY_MAX_CHARS))
                .unwrap_or_default();

            Some(RawArticle {
                title,
                url: item.link().unwrap_or_default().trim().to_string(),
                summary,
                source: source.to_string(),
                category,
                published_at: item.pub_date().and_then(parse_pub_date),
            })
        })
        .collect();

    Ok(articles)
}

/// Text content of an HTML fragment with whitespace collapsed.
fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>World</title>
    <link>https://example.com</link>
    <description>World news</description>
    <item>
      <title>Ceasefire talks resume in Cairo - Example Times</title>
      <link>https://example.com/a</link>
      <description><![CDATA[<p>Negotiators <b>returned</b> to the table.</p>]]></description>
      <pubDate>Thu, 29 Jan 2026 08:30:00 +0900</pubDate>
    </item>
    <item>
      <title>   </title>
      <link>https://example.com/blank</link>
    </item>
    <item>
      <title>Markets rally on rate hopes</title>
      <link>https://example.com/b</link>
    </item>
    <item>
      <title>Third story</title>
      <link>https://example.com/c</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed_maps_items() {
        let articles = parse_feed(FEED.as_bytes(), "BBC", Category::Global, 10, false).unwrap();

        assert_eq!(articles.len(), 3);
        let first = &articles[0];
        assert_eq!(first.title, "Ceasefire talks resume in Cairo - Example Times");
        assert_eq!(first.url, "https://example.com/a");
        assert_eq!(first.summary, "Negotiators returned to the table.");
        assert_eq!(first.source, "BBC");
        assert_eq!(first.category, Category::Global);
        assert_eq!(
            first.published_at,
            Some(Utc.with_ymd_and_hms(2026, 1, 28, 23, 30, 0).unwrap())
        );
        assert_eq!(articles[1].summary, "");
        assert_eq!(articles[1].published_at, None);
    }

    #[test]
    fn test_parse_feed_strips_publisher_suffix() {
        let articles = parse_feed(FEED.as_bytes(), "구글뉴스", Category::Domestic, 1, true).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Ceasefire talks resume in Cairo");
    }

    #[test]
    fn test_parse_feed_caps_before_skipping() {
        // The blank-titled item counts toward the cap, as the feed lists it.
        let articles = parse_feed(FEED.as_bytes(), "CNN", Category::Global, 2, false).unwrap();
        assert_eq!(articles.len(), 1);
    }

    #[test]
    fn test_parse_feed_truncates_long_descriptions() {
        let long = "가".repeat(300);
        let xml = format!(
            r#"<rss version="2.0"><channel><title>t</title><link>l</link><description>d</description>
<item><title>긴 기사</title><description>{long}</description></item></channel></rss>"#
        );
        let articles = parse_feed(xml.as_bytes(), "매일경제", Category::Economy, 5, false).unwrap();
        assert_eq!(articles[0].summary.chars().count(), SUMMARY_MAX_CHARS + 1);
        assert!(articles[0].summary.ends_with('…'));
        assert_eq!(articles[0].url, "");
    }

    #[test]
    fn test_parse_feed_rejects_garbage() {
        assert!(parse_feed(b"<html>not a feed</html>", "x", Category::Tech, 5, false).is_err());
    }

    #[test]
    fn test_builder_flags() {
        let source = RssSource::new("시사IN", Category::Analysis, "https://a", 5)
            .with_fallback("프레시안", "https://b")
            .validate_links();
        assert_eq!(source.name(), "시사IN");
        assert_eq!(source.category(), Category::Analysis);
        assert!(source.validate_links);
        assert!(!source.strip_title_suffix);
        assert_eq!(source.fallback.map(|f| f.name).as_deref(), Some("프레시안"));
    }
}
