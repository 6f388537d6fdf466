//! Ranking score for merged stories.
//!
//! | Signal                      | Points            |
//! |-----------------------------|-------------------|
//! | hot (2+ sources)            | +3                |
//! | `analysis` category         | +1                |
//! | summary longer than 30 chars| +1                |
//! | extra sources               | +min(n - 1, 2)    |
//!
//! The hot bonus and the source bonus stack.

use crate::models::{Category, MergedArticle};

const HOT_BONUS: u32 = 3;
const RICH_SUMMARY_CHARS: usize = 30;
const MAX_SOURCE_BONUS: usize = 2;

pub fn score(article: &MergedArticle) -> u32 {
    let mut score = 0;
    if article.is_hot() {
        score += HOT_BONUS;
    }
    if article.category() == Category::Analysis {
        score += 1;
    }
    if article.summary().chars().count() > RICH_SUMMARY_CHARS {
        score += 1;
    }
    let extra_sources = article.sources().len().saturating_sub(1).min(MAX_SOURCE_BONUS);
    score + extra_sources as u32
}
