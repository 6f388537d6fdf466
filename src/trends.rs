//! Keyword and volume statistics over the recent archive.
//!
//! Both reports are computed from the dated JSON snapshots only, so they work
//! for any archive the `run` command or the server has written.

use crate::engine::similarity::tokenize;
use crate::models::Digest;
use indexmap::IndexMap;
use serde::Serialize;

/// Snapshots considered by the keyword trend.
pub const TREND_DAYS: usize = 14;
/// Keywords kept in the trend.
pub const TREND_TOP: usize = 10;
/// Snapshots considered by the weekly summary.
pub const SUMMARY_DAYS: usize = 7;
/// Keywords kept in the weekly summary.
pub const SUMMARY_TOP: usize = 15;

const STOPWORDS: &[&str] = &[
    "이", "그", "저", "것", "수", "등", "및", "중", "내", "위", "후", "간", "전", "대", "월", "일",
    "년", "에서", "으로", "에게", "까지", "부터", "이후", "관련", "대한", "통해", "하는", "있는",
    "되는", "된다", "위해", "따라", "대해", "있다", "없다", "했다", "한다", "같은", "모든", "이번",
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "in", "on", "at", "to",
    "for", "of", "with", "by", "from", "as", "and", "or", "but", "not", "no", "it", "its", "this",
    "that", "has", "have", "had", "do", "does", "did", "will", "would", "could", "should", "may",
    "might", "can", "new", "says", "said", "us", "we", "they", "who", "how",
];

/// Lower-cased title words worth counting: punctuation stripped, single
/// characters and stopwords dropped.
pub fn extract_keywords(title: &str) -> Vec<String> {
    tokenize(title)
        .into_iter()
        .filter(|word| !STOPWORDS.contains(&word.as_str()))
        .collect()
}

/// Daily occurrences of one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordSeries {
    pub total: usize,
    /// One count per entry of [`KeywordTrend::dates`].
    pub by_date: Vec<usize>,
}

/// The most frequent headline keywords and how they moved day by day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeywordTrend {
    pub dates: Vec<String>,
    /// Most frequent first; ties keep the order the keyword first appeared.
    pub keywords: IndexMap<String, KeywordSeries>,
}

/// Build the trend from `(date, snapshot)` pairs, oldest first.
///
/// Unreadable snapshots (`None`) keep their slot in `dates` with zero counts.
///
/// # Arguments
///
/// * `days` - Snapshots as returned by [`crate::outputs::json::read_recent`]
/// * `top` - Number of keywords to keep
pub fn keyword_trend(days: &[(String, Option<Digest>)], top: usize) -> KeywordTrend {
    let dates: Vec<String> = days.iter().map(|(date, _)| date.clone()).collect();
    let mut keywords: IndexMap<String, KeywordSeries> = IndexMap::new();

    for (slot, (_, digest)) in days.iter().enumerate() {
        let Some(digest) = digest else { continue };
        for article in &digest.articles {
            for keyword in extract_keywords(article.title()) {
                let series = keywords.entry(keyword).or_insert_with(|| KeywordSeries {
                    total: 0,
                    by_date: vec![0; dates.len()],
                });
                series.total += 1;
                series.by_date[slot] += 1;
            }
        }
    }

    keywords.sort_by(|_, a, _, b| b.total.cmp(&a.total));
    keywords.truncate(top);
    KeywordTrend { dates, keywords }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub count: usize,
    pub hot: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

/// Totals over the last week of snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub total_articles: usize,
    pub hot_articles: usize,
    pub keywords: Vec<KeywordCount>,
    /// Stories each outlet contributed to, in first-seen order.
    pub source_counts: IndexMap<String, usize>,
    /// One entry per readable snapshot, oldest first.
    pub daily_counts: Vec<DailyCount>,
}

/// Summarise `(date, snapshot)` pairs, oldest first. Unreadable snapshots
/// are left out entirely.
pub fn weekly_summary(days: &[(String, Option<Digest>)], top: usize) -> WeeklySummary {
    let mut summary = WeeklySummary::default();
    let mut keywords: IndexMap<String, usize> = IndexMap::new();

    for (date, digest) in days {
        let Some(digest) = digest else { continue };
        let hot = digest.hot_count();
        summary.total_articles += digest.articles.len();
        summary.hot_articles += hot;
        summary.daily_counts.push(DailyCount {
            date: date.clone(),
            count: digest.articles.len(),
            hot,
        });

        for article in &digest.articles {
            for source in article.sources() {
                *summary.source_counts.entry(source.clone()).or_insert(0) += 1;
            }
            for keyword in extract_keywords(article.title()) {
                *keywords.entry(keyword).or_insert(0) += 1;
            }
        }
    }

    keywords.sort_by(|_, a, _, b| b.cmp(a));
    summary.keywords = keywords
        .into_iter()
        .take(top)
        .map(|(keyword, count)| KeywordCount { keyword, count })
        .collect();
    summary
}
