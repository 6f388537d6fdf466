//! Greedy clustering of raw headlines into story clusters.
//!
//! Single forward pass: each article joins the *first* existing cluster (in
//! creation order) whose title is similar enough, otherwise it opens a new
//! cluster. The result depends on input order on purpose: the first source to
//! report a story decides its title and category.

use crate::config::{validate_threshold, DEFAULT_SIMILARITY_THRESHOLD};
use crate::engine::similarity::similarity;
use crate::error::ConfigError;
use crate::models::{MergedArticle, RawArticle};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeEngine {
    threshold: f64,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl MergeEngine {
    /// Create an engine that merges titles at or above `threshold`.
    ///
    /// # Arguments
    ///
    /// * `threshold` - Minimum title similarity, within `[0, 1]`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidThreshold`] if `threshold` is NaN or
    /// outside `[0, 1]`.
    pub fn new(threshold: f64) -> Result<Self, ConfigError> {
        validate_threshold(threshold)?;
        Ok(Self { threshold })
    }

    /// Cluster `articles`, then order hot clusters first and, within each
    /// tier, by descending source count. The sort is stable.
    pub fn merge(&self, articles: &[RawArticle]) -> Vec<MergedArticle> {
        let mut clusters: Vec<MergedArticle> = Vec::new();

        for article in articles {
            match clusters
                .iter()
                .position(|c| similarity(&article.title, c.title()) >= self.threshold)
            {
                Some(idx) => {
                    let cluster = &mut clusters[idx];
                    debug!(title = %article.title, into = %cluster.title(), source = %article.source, "Merged headline");
                    cluster.absorb(article);
                }
                None => clusters.push(MergedArticle::seed(article)),
            }
        }

        for cluster in &mut clusters {
            cluster.refresh_hotness();
        }

        clusters.sort_by(|a, b| {
            b.is_hot()
                .cmp(&a.is_hot())
                .then_with(|| b.sources().len().cmp(&a.sources().len()))
        });

        debug!(input = articles.len(), clusters = clusters.len(), "Merged headlines");
        clusters
    }
}
