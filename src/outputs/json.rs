//! JSON snapshots of the digest.
//!
//! # Output Structure
//!
//! ```text
//! archive_dir/
//! ├── latest-digest.json     # overwritten on every run
//! ├── digest_2026-01-28.json
//! └── digest_2026-01-29.json
//! ```
//!
//! The same files are read back by the server for the latest-digest and
//! archive endpoints.

use crate::models::Digest;
use chrono::NaiveDate;
use serde::Serialize;
use std::error::Error;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};

pub const LATEST_FILE: &str = "latest-digest.json";
const ARCHIVE_PREFIX: &str = "digest_";
const ARCHIVE_SUFFIX: &str = ".json";

/// Summary line of one archived digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveEntry {
    pub date: String,
    pub date_display: String,
    pub article_count: usize,
    pub hot_count: usize,
}

/// File name of the dated snapshot for `date` (`YYYY-MM-DD`).
pub fn archive_file_name(date: &str) -> String {
    format!("{ARCHIVE_PREFIX}{date}{ARCHIVE_SUFFIX}")
}

/// Write `latest-digest.json` and the dated snapshot, pretty-printed.
///
/// # Arguments
///
/// * `digest` - The digest to persist
/// * `archive_dir` - Target directory, created if missing
///
/// # Returns
///
/// The two paths written: the latest file first, then the dated snapshot.
///
/// # Errors
///
/// Returns an error if serialization fails, the directory cannot be created
/// or either file cannot be written.
#[instrument(level = "info", skip_all, fields(archive_dir = %archive_dir.display()))]
pub async fn write_digest(
    digest: &Digest,
    archive_dir: &Path,
) -> Result<Vec<PathBuf>, Box<dyn Error + Send + Sync>> {
    let json = serde_json::to_string_pretty(digest)?;

    if let Err(e) = fs::create_dir_all(archive_dir).await {
        error!(error = %e, "Failed to create archive dir");
        return Err(e.into());
    }

    let paths = vec![
        archive_dir.join(LATEST_FILE),
        archive_dir.join(archive_file_name(&digest.date_stamp())),
    ];
    for path in &paths {
        fs::write(path, &json).await?;
        info!(path = %path.display(), "Wrote digest JSON");
    }
    Ok(paths)
}

/// Read `latest-digest.json`, or `None` when no run has written it yet.
pub async fn read_latest(archive_dir: &Path) -> Result<Option<Digest>, Box<dyn Error + Send + Sync>> {
    read_optional(&archive_dir.join(LATEST_FILE)).await
}

/// Read the snapshot for `date`, or `None` when it does not exist.
///
/// `date` must be a `YYYY-MM-DD` calendar date; anything else is an error so
/// that request input never reaches the file system as a path.
pub async fn read_archived(
    archive_dir: &Path,
    date: &str,
) -> Result<Option<Digest>, Box<dyn Error + Send + Sync>> {
    if parse_date_stamp(date).is_none() {
        return Err(format!("invalid date stamp: {date:?}").into());
    }
    read_optional(&archive_dir.join(archive_file_name(date))).await
}

/// Parse a zero-padded `YYYY-MM-DD` date stamp.
pub fn parse_date_stamp(date: &str) -> Option<NaiveDate> {
    if date.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// All archived snapshots, newest first.
///
/// A snapshot that cannot be parsed is still listed, with its date as the
/// display date and zero counts.
///
/// # Arguments
///
/// * `archive_dir` - Directory the snapshots were written to
///
/// # Returns
///
/// One [`ArchiveEntry`] per `digest_YYYY-MM-DD.json` file. A missing
/// directory yields an empty list.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
#[instrument(level = "info", skip_all, fields(archive_dir = %archive_dir.display()))]
pub async fn list_archive(archive_dir: &Path) -> Result<Vec<ArchiveEntry>, Box<dyn Error + Send + Sync>> {
    let mut dates = archived_dates(archive_dir).await?;
    dates.reverse();

    let mut entries = Vec::with_capacity(dates.len());
    for date in dates {
        match read_optional(&archive_dir.join(archive_file_name(&date))).await {
            Ok(Some(digest)) => entries.push(ArchiveEntry {
                date_display: digest.date_display.clone(),
                article_count: digest.articles.len(),
                hot_count: digest.hot_count(),
                date,
            }),
            Ok(None) => {}
            Err(e) => {
                warn!(%date, error = %e, "Unreadable archive file; listing without counts");
                entries.push(ArchiveEntry {
                    date_display: date.clone(),
                    article_count: 0,
                    hot_count: 0,
                    date,
                });
            }
        }
    }
    debug!(count = entries.len(), "Listed archive");
    Ok(entries)
}

/// The newest `count` snapshots, oldest first.
///
/// Each date is paired with its digest, or `None` when the file could not be
/// read or parsed.
#[instrument(level = "info", skip_all, fields(archive_dir = %archive_dir.display(), count = count))]
pub async fn read_recent(
    archive_dir: &Path,
    count: usize,
) -> Result<Vec<(String, Option<Digest>)>, Box<dyn Error + Send + Sync>> {
    let dates = archived_dates(archive_dir).await?;
    let skip = dates.len().saturating_sub(count);

    let mut days = Vec::with_capacity(dates.len() - skip);
    for date in dates.into_iter().skip(skip) {
        let digest = match read_optional(&archive_dir.join(archive_file_name(&date))).await {
            Ok(digest) => digest,
            Err(e) => {
                warn!(%date, error = %e, "Unreadable archive file; skipping");
                None
            }
        };
        days.push((date, digest));
    }
    Ok(days)
}

/// Dates of every well-formed snapshot file, oldest first.
async fn archived_dates(archive_dir: &Path) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
    let mut dir = match fs::read_dir(archive_dir).await {
        Ok(dir) => dir,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut dates = Vec::new();
    while let Some(entry) = dir.next_entry().await? {
        let name = entry.file_name();
        let Some(date) = name
            .to_str()
            .and_then(|n| n.strip_prefix(ARCHIVE_PREFIX))
            .and_then(|n| n.strip_suffix(ARCHIVE_SUFFIX))
        else {
            continue;
        };
        if parse_date_stamp(date).is_some() {
            dates.push(date.to_string());
        }
    }
    dates.sort_unstable();
    Ok(dates)
}

async fn read_optional(path: &Path) -> Result<Option<Digest>, Box<dyn Error + Send + Sync>> {
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&text)?))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Category, MergedArticle, RawArticle};
    use chrono::{DateTime, TimeZone, Utc};

    pub(crate) fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("news_digest_{tag}_{}", std::process::id()))
    }

    pub(crate) fn sample_digest(date: DateTime<Utc>) -> Digest {
        let mut hot = MergedArticle::seed(
            &RawArticle::new("폭설 피해 확산", "네이버", Category::Domestic)
                .with_url("https://news.naver.com/a")
                .with_summary("전국에 대설 경보가 내려졌다."),
        );
        hot.absorb(&RawArticle::new("폭설 피해 확산 중", "SBS", Category::Domestic).with_url("https://sbs.co.kr/b"));
        hot.refresh_hotness();
        let mut cold = MergedArticle::seed(&RawArticle::new("Ceasefire <talks> resume", "BBC", Category::Global));
        cold.refresh_hotness();

        Digest {
            date,
            date_display: crate::utils::korean_date_display(date),
            articles: vec![hot, cold],
            active_sources: vec!["네이버".into(), "SBS".into(), "BBC".into()],
            failures: vec![],
        }
    }

    #[tokio::test]
    async fn test_write_then_read_back() {
        let dir = temp_dir("json_write");
        let digest = sample_digest(Utc.with_ymd_and_hms(2026, 1, 29, 1, 0, 0).unwrap());

        let paths = write_digest(&digest, &dir).await.unwrap();
        assert!(paths[0].ends_with(LATEST_FILE));
        assert!(paths[1].ends_with("digest_2026-01-29.json"));

        let raw = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(raw.contains("\"dateDisplay\""));
        assert!(raw.contains("\"isHot\": true"));

        assert_eq!(read_latest(&dir).await.unwrap(), Some(digest.clone()));
        assert_eq!(read_archived(&dir, "2026-01-29").await.unwrap(), Some(digest));
        assert_eq!(read_archived(&dir, "2026-01-30").await.unwrap(), None);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_read_archived_rejects_non_dates() {
        let dir = temp_dir("json_reject");
        assert!(read_archived(&dir, "../secrets").await.is_err());
        assert!(read_archived(&dir, "2026-13-01").await.is_err());
        assert!(read_archived(&dir, "2026-1-29").await.is_err());
    }

    #[tokio::test]
    async fn test_list_archive_newest_first() {
        let dir = temp_dir("json_list");
        for day in [27, 29, 28] {
            let digest = sample_digest(Utc.with_ymd_and_hms(2026, 1, day, 1, 0, 0).unwrap());
            write_digest(&digest, &dir).await.unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "ignore me").unwrap();
        std::fs::write(dir.join("digest_2026-01-20.json"), "{ truncated").unwrap();

        let entries = list_archive(&dir).await.unwrap();
        let dates: Vec<&str> = entries.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2026-01-29", "2026-01-28", "2026-01-27", "2026-01-20"]);
        assert_eq!(entries[0].article_count, 2);
        assert_eq!(entries[0].hot_count, 1);
        assert_eq!(entries[0].date_display, "2026년 1월 29일 목요일");
        assert_eq!(entries[3].date_display, "2026-01-20");
        assert_eq!(entries[3].article_count, 0);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let dir = temp_dir("json_missing");
        assert!(list_archive(&dir).await.unwrap().is_empty());
        assert!(read_recent(&dir, 7).await.unwrap().is_empty());
        assert_eq!(read_latest(&dir).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_recent_keeps_newest_oldest_first() {
        let dir = temp_dir("json_recent");
        for day in [26, 29, 27] {
            let digest = sample_digest(Utc.with_ymd_and_hms(2026, 1, day, 1, 0, 0).unwrap());
            write_digest(&digest, &dir).await.unwrap();
        }
        std::fs::write(dir.join("digest_2026-01-28.json"), "{ truncated").unwrap();

        let days = read_recent(&dir, 3).await.unwrap();
        let dates: Vec<&str> = days.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(dates, vec!["2026-01-27", "2026-01-28", "2026-01-29"]);
        assert!(days[0].1.is_some());
        assert!(days[1].1.is_none());
        assert_eq!(days[2].1.as_ref().unwrap().articles.len(), 2);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
