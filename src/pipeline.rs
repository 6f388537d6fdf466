//! One digest run: collect, merge, select, annotate.
//!
//! ```text
//! gather ──► build_digest ──► annotate (optional) ──► renderers
//!  (I/O)        (pure)          (LLM, best effort)
//! ```
//!
//! [`gather`] never fails; every source error is kept as a
//! [`SourceFailure`]. [`build_digest`] fails only when nothing at all was
//! collected or the settings are invalid.

use crate::config::Settings;
use crate::engine::{select_top, MergeEngine};
use crate::error::DigestError;
use crate::models::{Digest, RawArticle, SourceFailure};
use crate::perspective::{attach_counter_views, generate_batch, PerspectiveGenerator};
use crate::scrapers::NewsSource;
use crate::utils::korean_date_display;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use itertools::Itertools;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Everything the sources returned in one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    /// Articles in registry order, each source's items in feed order.
    pub articles: Vec<RawArticle>,
    pub failures: Vec<SourceFailure>,
    /// Distinct `source` values of `articles`, first-seen order.
    pub active_sources: Vec<String>,
}

/// Fetch every source concurrently and keep whatever succeeds.
///
/// # Returns
///
/// The articles of every source that answered, in registry order, plus one
/// [`SourceFailure`] per source that did not. This function never fails.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn gather(client: &Client, sources: &[Box<dyn NewsSource>]) -> Collection {
    let t0 = Instant::now();
    let results = join_all(sources.iter().map(|source| source.fetch(client))).await;

    let mut collection = Collection::default();
    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(articles) => {
                info!(source = %source.name(), count = articles.len(), "Collected");
                collection.articles.extend(articles);
            }
            Err(e) => {
                error!(source = %source.name(), error = %e, "Source failed");
                collection.failures.push(SourceFailure {
                    source: source.name().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    collection.active_sources = collection
        .articles
        .iter()
        .map(|a| a.source.clone())
        .unique()
        .collect();

    if !collection.failures.is_empty() {
        warn!(
            failed = collection.failures.len(),
            sources = %collection.failures.iter().map(|f| f.source.as_str()).join(", "),
            "Some sources failed"
        );
    }
    info!(
        total = collection.articles.len(),
        active = %collection.active_sources.join(", "),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Collection finished"
    );
    collection
}

/// Merge and rank a collection into a dated digest.
///
/// # Arguments
///
/// * `collection` - Output of [`gather`]
/// * `settings` - Similarity threshold and selection quotas
/// * `now` - Run time, stored as the digest date
///
/// # Errors
///
/// Returns [`DigestError::AllSourcesFailed`] when no source produced an
/// article, and a configuration error when the threshold is out of range.
#[instrument(level = "info", skip_all, fields(articles = collection.articles.len()))]
pub fn build_digest(
    collection: Collection,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<Digest, DigestError> {
    if collection.articles.is_empty() {
        return Err(DigestError::AllSourcesFailed {
            failed: collection.failures.len(),
        });
    }

    let engine = MergeEngine::new(settings.similarity_threshold)?;
    let merged = engine.merge(&collection.articles);
    info!(merged = merged.len(), "Merged near-duplicates");

    let articles = select_top(merged, settings.max_total, &settings.category_min);
    let digest = Digest {
        date: now,
        date_display: korean_date_display(now),
        articles,
        active_sources: collection.active_sources,
        failures: collection.failures,
    };
    info!(
        selected = digest.articles.len(),
        hot = digest.hot_count(),
        max_total = settings.max_total,
        "Selected top stories"
    );
    Ok(digest)
}

/// Attach counter views to up to `max_items` stories. Never fails the run.
#[instrument(level = "info", skip_all, fields(max_items = max_items))]
pub async fn annotate<G: PerspectiveGenerator>(digest: &mut Digest, generator: &G, max_items: usize) {
    let views = generate_batch(generator, &digest.articles, max_items).await;
    let attached = attach_counter_views(&mut digest.articles, views);
    debug!(attached, "Counter views attached");
}
