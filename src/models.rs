//! Data models shared by the fetchers, the merge engine and the renderers.
//!
//! - [`RawArticle`]: one headline as produced by a single source fetcher
//! - [`MergedArticle`]: a story cluster, possibly corroborated by several sources
//! - [`Digest`]: the dated bundle handed to every renderer
//!
//! Serialized field names are camelCase so that archived JSON snapshots stay
//! readable by the dashboard that consumes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Editorial category of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Domestic,
    Tech,
    Economy,
    Global,
    Analysis,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Domestic => "domestic",
            Category::Tech => "tech",
            Category::Economy => "economy",
            Category::Global => "global",
            Category::Analysis => "analysis",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A headline as returned by one source fetcher.
///
/// `summary` and `url` may be empty; the merge engine treats an empty summary
/// as shorter than anything and creates no link for an empty url.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub summary: String,
    pub source: String,
    pub category: Category,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl RawArticle {
    pub fn new(title: &str, source: &str, category: Category) -> Self {
        Self {
            title: title.to_string(),
            url: String::new(),
            summary: String::new(),
            source: source.to_string(),
            category,
            published_at: None,
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }
}

/// A link to the same story at one particular source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceLink {
    pub source: String,
    pub url: String,
}

/// One story cluster.
///
/// Title and category are fixed by the article that created the cluster.
/// Later members can only add sources and links or replace the summary with a
/// longer one. `is_hot` is derived from the number of sources and is refreshed
/// through [`MergedArticle::refresh_hotness`], never assigned directly.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedArticle {
    title: String,
    summary: String,
    sources: Vec<String>,
    links: Vec<SourceLink>,
    category: Category,
    is_hot: bool,
    #[serde(default)]
    counter_view: Option<CounterView>,
}

impl MergedArticle {
    /// Start a new cluster from its first member.
    pub fn seed(article: &RawArticle) -> Self {
        let links = if article.url.is_empty() {
            Vec::new()
        } else {
            vec![SourceLink {
                source: article.source.clone(),
                url: article.url.clone(),
            }]
        };
        Self {
            title: article.title.clone(),
            summary: article.summary.clone(),
            sources: vec![article.source.clone()],
            links,
            category: article.category,
            is_hot: false,
            counter_view: None,
        }
    }

    /// Fold a matching article into this cluster.
    pub fn absorb(&mut self, article: &RawArticle) {
        if !self.sources.contains(&article.source) {
            self.sources.push(article.source.clone());
        }
        if article.summary.chars().count() > self.summary.chars().count() {
            self.summary = article.summary.clone();
        }
        if !article.url.is_empty() && !self.links.iter().any(|l| l.source == article.source) {
            self.links.push(SourceLink {
                source: article.source.clone(),
                url: article.url.clone(),
            });
        }
    }

    /// Recompute the hot flag from the current source count.
    pub fn refresh_hotness(&mut self) {
        self.is_hot = self.sources.len() >= 2;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn links(&self) -> &[SourceLink] {
        &self.links
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_hot(&self) -> bool {
        self.is_hot
    }

    pub fn counter_view(&self) -> Option<&CounterView> {
        self.counter_view.as_ref()
    }

    pub fn set_counter_view(&mut self, view: CounterView) {
        self.counter_view = Some(view);
    }
}

/// One rebuttal point inside a [`CounterView`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CounterArgument {
    #[serde(default)]
    pub point: String,
    #[serde(default)]
    pub explanation: String,
}

/// An AI-generated opposing perspective on one story.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterView {
    pub original_title: String,
    pub original_claim: String,
    pub counter_arguments: Vec<CounterArgument>,
    pub alternative_viewpoint: String,
    pub is_hot: bool,
}

/// A source that could not be collected during a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

/// The dated output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Digest {
    /// Run timestamp, serialized as RFC 3339 / ISO-8601 in UTC.
    pub date: DateTime<Utc>,
    /// Localized long date, e.g. `2026년 1월 29일 목요일`.
    pub date_display: String,
    pub articles: Vec<MergedArticle>,
    pub active_sources: Vec<String>,
    pub failures: Vec<SourceFailure>,
}

impl Digest {
    /// `YYYY-MM-DD` of the run in UTC, used to name archive files.
    pub fn date_stamp(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn hot_count(&self) -> usize {
        self.articles.iter().filter(|a| a.is_hot()).count()
    }
}
