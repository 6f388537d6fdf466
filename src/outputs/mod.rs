//! Renderers for a finished digest.
//!
//! # Submodules
//!
//! - [`json`]: JSON snapshots, also read back by the server
//! - [`markdown`]: Markdown archive plus an optional "today" copy
//! - [`html`]: self-contained email body
//! - [`feed`]: RSS 2.0 feed of the newest digest
//!
//! # Output Structure
//!
//! ```text
//! archive_dir/
//! ├── latest-digest.json
//! ├── digest_2026-01-29.json
//! ├── news_2026-01-29.md
//! ├── news_2026-01-29.html
//! └── feed.xml
//! ```
//!
//! Writers are independent: one failing is logged and the others still run.

pub mod feed;
pub mod html;
pub mod json;
pub mod markdown;

use crate::models::Digest;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

/// Channel link used in `feed.xml` when no public URL is configured.
pub const DEFAULT_SITE_LINK: &str = "https://news.naver.com";

/// Where and how to write the renderings of one digest.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions<'a> {
    pub archive_dir: &'a Path,
    /// Extra copy of the Markdown archive, overwritten on every run.
    pub today_path: Option<&'a Path>,
    /// Target of the refresh button in the email body.
    pub refresh_url: Option<&'a str>,
    /// Public page of the digest, used as the feed's channel link.
    pub site_url: Option<&'a str>,
}

/// Run every writer. Failures are logged only.
///
/// # Arguments
///
/// * `digest` - The finished digest
/// * `opts` - Target paths and links for the renderings
///
/// # Returns
///
/// The paths of every file written. An empty list means every writer failed.
#[instrument(level = "info", skip_all, fields(archive_dir = %opts.archive_dir.display()))]
pub async fn write_all(digest: &Digest, opts: OutputOptions<'_>) -> Vec<PathBuf> {
    let mut written = Vec::new();

    match json::write_digest(digest, opts.archive_dir).await {
        Ok(paths) => written.extend(paths),
        Err(e) => error!(error = %e, "Failed to write digest JSON"),
    }
    match markdown::write_markdown(digest, opts.archive_dir, opts.today_path).await {
        Ok(paths) => written.extend(paths),
        Err(e) => error!(error = %e, "Failed to write Markdown"),
    }
    match html::write_email_html(digest, opts.archive_dir, opts.refresh_url).await {
        Ok(path) => written.push(path),
        Err(e) => error!(error = %e, "Failed to write email HTML"),
    }
    let site_link = opts.site_url.unwrap_or(DEFAULT_SITE_LINK);
    match feed::write_feed(digest, opts.archive_dir, site_link).await {
        Ok(path) => written.push(path),
        Err(e) => error!(error = %e, "Failed to write RSS feed"),
    }

    info!(files = written.len(), "Outputs written");
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::json::tests::{sample_digest, temp_dir};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_write_all_produces_every_file() {
        let dir = temp_dir("outputs_all");
        let digest = sample_digest(Utc.with_ymd_and_hms(2026, 1, 29, 1, 0, 0).unwrap());
        let opts = OutputOptions {
            archive_dir: &dir,
            today_path: None,
            refresh_url: None,
            site_url: None,
        };

        let written = write_all(&digest, opts).await;
        let names: Vec<String> = written
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect();
        assert_eq!(
            names,
            vec![
                "latest-digest.json",
                "digest_2026-01-29.json",
                "news_2026-01-29.md",
                "news_2026-01-29.html",
                "feed.xml",
            ]
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_write_all_survives_a_failing_writer() {
        let dir = temp_dir("outputs_partial");
        std::fs::create_dir_all(&dir).unwrap();
        // A directory where the today copy should go makes that write fail.
        let blocked = dir.join("blocked");
        std::fs::create_dir_all(&blocked).unwrap();
        let digest = sample_digest(Utc.with_ymd_and_hms(2026, 1, 29, 1, 0, 0).unwrap());
        let opts = OutputOptions {
            archive_dir: &dir,
            today_path: Some(&blocked),
            refresh_url: None,
            site_url: None,
        };

        let written = write_all(&digest, opts).await;
        assert!(written.iter().any(|p| p.ends_with("feed.xml")));
        assert!(written.iter().any(|p| p.ends_with("news_2026-01-29.html")));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
