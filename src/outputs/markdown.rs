//! Markdown archive of the digest.
//!
//! Writes `news_<date>.md` into the archive directory and, when configured,
//! the same document to a fixed "today" path that always holds the newest run.

use crate::models::Digest;
use crate::utils::{display_source, format_sources};
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Render the digest as a Markdown document.
pub fn digest_to_markdown(digest: &Digest) -> String {
    let mut md = String::new();

    writeln!(md, "# 오늘의 인기 뉴스\n").unwrap();
    writeln!(md, "**날짜:** {}\n", digest.date_display).unwrap();
    writeln!(md, "**수집 소스:** {}\n", format_sources(&digest.active_sources)).unwrap();
    writeln!(md, "---\n").unwrap();

    for (i, article) in digest.articles.iter().enumerate() {
        let hot = if article.is_hot() { "🔥 **[HOT]** " } else { "" };
        writeln!(md, "## {}. {}{}\n", i + 1, hot, article.title()).unwrap();
        writeln!(md, "**출처:** {}\n", format_sources(article.sources())).unwrap();
        if !article.summary().is_empty() {
            writeln!(md, "**요약:** {}\n", article.summary()).unwrap();
        }
        if !article.links().is_empty() {
            writeln!(md, "**링크:**").unwrap();
            for link in article.links() {
                writeln!(md, "- [{}]({})", display_source(&link.source), link.url).unwrap();
            }
            md.push('\n');
        }
        writeln!(md, "---\n").unwrap();
    }

    md
}

/// Write the archive file and the optional "today" copy.
#[instrument(level = "info", skip_all, fields(archive_dir = %archive_dir.display()))]
pub async fn write_markdown(
    digest: &Digest,
    archive_dir: &Path,
    today_path: Option<&Path>,
) -> Result<Vec<PathBuf>, Box<dyn Error + Send + Sync>> {
    let md = digest_to_markdown(digest);
    fs::create_dir_all(archive_dir).await?;

    let archive_path = archive_dir.join(format!("news_{}.md", digest.date_stamp()));
    fs::write(&archive_path, &md).await?;
    info!(path = %archive_path.display(), "Wrote Markdown archive");

    let mut written = vec![archive_path];
    if let Some(today) = today_path {
        if let Some(parent) = today.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(today, &md).await?;
        info!(path = %today.display(), "Wrote latest Markdown");
        written.push(today.to_path_buf());
    }
    Ok(written)
}
