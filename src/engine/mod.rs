//! Deduplication and ranking core.
//!
//! Pure, synchronous transformations over one in-memory snapshot:
//!
//! - [`similarity`]: token-overlap score between two titles
//! - [`merge`]: greedy clustering of raw headlines into [`MergedArticle`]s
//! - [`scoring`]: ranking score per cluster
//! - [`selector`]: category quotas plus score-ordered fill
//!
//! Nothing here performs I/O or keeps state between calls.
//!
//! [`MergedArticle`]: crate::models::MergedArticle

pub mod merge;
pub mod scoring;
pub mod selector;
pub mod similarity;

pub use merge::MergeEngine;
pub use selector::select_top;
