//! Pipeline tuning knobs.
//!
//! Settings come from an optional YAML file; anything not given falls back to
//! the defaults below. Example:
//!
//! ```yaml
//! similarity_threshold: 0.4
//! max_total: 15
//! category_min:
//!   domestic: 4
//!   analysis: 2
//!   global: 5
//! ```
//!
//! `category_min` keeps the order of the file: quotas are filled in that
//! order, which decides who wins when the same article could satisfy two
//! passes.

use crate::error::ConfigError;
use crate::models::Category;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.4;
pub const DEFAULT_MAX_TOTAL: usize = 15;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Minimum title similarity for two headlines to be the same story.
    pub similarity_threshold: f64,
    /// Cap on the number of selected articles (quotas may overshoot it).
    pub max_total: usize,
    /// Guaranteed slots per category, filled in map order.
    pub category_min: IndexMap<Category, usize>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut category_min = IndexMap::new();
        category_min.insert(Category::Domestic, 4);
        category_min.insert(Category::Analysis, 2);
        category_min.insert(Category::Global, 5);
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_total: DEFAULT_MAX_TOTAL,
            category_min,
        }
    }
}

impl Settings {
    /// Parse and validate settings from YAML text.
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`, or the defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid YAML, and
    /// [`ConfigError::InvalidThreshold`] if the threshold is out of range.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No settings file given; using defaults");
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_yaml(&text, path)?;
        info!(
            threshold = settings.similarity_threshold,
            max_total = settings.max_total,
            quotas = settings.category_min.len(),
            "Loaded settings"
        );
        Ok(settings)
    }

    /// Reject values that would make the output meaningless.
    ///
    /// Negative caps and quotas are already impossible through `usize`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_threshold(self.similarity_threshold)
    }
}

pub fn validate_threshold(threshold: f64) -> Result<(), ConfigError> {
    if threshold.is_nan() || !(0.0..=1.0).contains(&threshold) {
        return Err(ConfigError::InvalidThreshold(threshold));
    }
    Ok(())
}
