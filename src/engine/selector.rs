//! Category-quota selection of the final article list.
//!
//! 1. Every article is scored once.
//! 2. For each category in quota order, the best-scoring not-yet-selected
//!    articles of that category are taken, up to the quota.
//! 3. Remaining slots up to `max_total` are filled from everything left,
//!    best score first.
//!
//! All sorts are stable, so equal scores keep their input order. Quotas are
//! floors: when they add up to more than `max_total` the quota phase alone can
//! return more than `max_total` articles, and nothing is truncated afterwards.

use crate::engine::scoring::score;
use crate::models::{Category, MergedArticle};
use indexmap::IndexMap;
use std::cmp::Reverse;
use tracing::debug;

/// Select with the standard [`score`].
pub fn select_top(
    articles: Vec<MergedArticle>,
    max_total: usize,
    category_min: &IndexMap<Category, usize>,
) -> Vec<MergedArticle> {
    select_top_by(articles, max_total, category_min, score)
}

/// Select with a caller-provided scoring function.
///
/// # Arguments
///
/// * `articles` - Merged candidates, already in merge order
/// * `max_total` - Target size of the front page
/// * `category_min` - Per-category floors, filled in map order
/// * `score_fn` - Ranking key; higher scores are picked first
///
/// # Returns
///
/// The picked articles in selection order: quota picks first, then the
/// best remaining scores. Ties keep their input order.
pub fn select_top_by<F>(
    articles: Vec<MergedArticle>,
    max_total: usize,
    category_min: &IndexMap<Category, usize>,
    score_fn: F,
) -> Vec<MergedArticle>
where
    F: Fn(&MergedArticle) -> u32,
{
    let scores: Vec<u32> = articles.iter().map(&score_fn).collect();
    let mut taken = vec![false; articles.len()];
    let mut picked: Vec<usize> = Vec::new();

    for (category, min) in category_min {
        let mut pool: Vec<usize> = (0..articles.len())
            .filter(|&i| !taken[i] && articles[i].category() == *category)
            .collect();
        pool.sort_by_key(|&i| Reverse(scores[i]));

        for i in pool.into_iter().take(*min) {
            taken[i] = true;
            picked.push(i);
        }
        debug!(%category, min, selected = picked.len(), "Quota pass done");
    }

    let mut rest: Vec<usize> = (0..articles.len()).filter(|&i| !taken[i]).collect();
    rest.sort_by_key(|&i| Reverse(scores[i]));
    let slots_left = max_total.saturating_sub(picked.len());
    picked.extend(rest.into_iter().take(slots_left));

    let mut slots: Vec<Option<MergedArticle>> = articles.into_iter().map(Some).collect();
    picked
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}
