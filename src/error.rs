//! Error types for the digest pipeline.
//!
//! Only the conditions a caller can act on are typed here. Source fetchers,
//! renderers and the LLM adapter report through boxed errors and are isolated
//! by the pipeline, so they never surface as a [`DigestError`].

use std::path::PathBuf;
use thiserror::Error;

/// Invalid pipeline configuration. Raised before any work is done.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Similarity threshold outside `[0, 1]` or NaN.
    #[error("similarity threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    /// The settings file could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid YAML for [`crate::config::Settings`].
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors that abort a digest run.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Every registered source failed or returned nothing.
    #[error("no articles collected ({failed} source(s) failed)")]
    AllSourcesFailed { failed: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An analyst reply that could not be turned into a counter view.
#[derive(Debug, Error)]
pub enum PerspectiveError {
    #[error("reply contains no JSON object")]
    NoJson,

    #[error("reply JSON does not match the counter-view shape: {0}")]
    Shape(#[from] serde_json::Error),
}
