//! Text helpers shared by fetchers and renderers, plus output-directory checks.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Sentence endings recognised by [`truncate_sentence`].
const SENTENCE_ENDS: [&str; 4] = [". ", "다.", "요.", "음."];

/// Display names for sources whose identifier is terse.
const SOURCE_DISPLAY: [(&str, &str); 3] = [("네이버", "네이버뉴스"), ("AP", "AP통신"), ("SBS", "SBS뉴스")];

const KOREAN_WEEKDAYS: [&str; 7] = ["월요일", "화요일", "수요일", "목요일", "금요일", "토요일", "일요일"];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Cut `text` to at most `max_len` characters, preferring a sentence end.
///
/// If a sentence ending sits past the middle of the cut, the text stops right
/// after its first character; otherwise the hard cut gets an ellipsis.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_sentence("짧은 글", 100), "짧은 글");
/// ```
pub fn truncate_sentence(text: &str, max_len: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_len {
        return text.to_string();
    }
    let cut = &chars[..max_len];

    let last_end = SENTENCE_ENDS
        .iter()
        .filter_map(|pat| rfind_chars(cut, pat))
        .max();

    match last_end {
        Some(pos) if pos * 2 > max_len => cut[..=pos].iter().collect(),
        _ => {
            let mut s: String = cut.iter().collect();
            s.push('…');
            s
        }
    }
}

/// Character index of the last occurrence of `pat` in `haystack`.
fn rfind_chars(haystack: &[char], pat: &str) -> Option<usize> {
    let needle: Vec<char> = pat.chars().collect();
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == needle[..])
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Escape text for inclusion in HTML bodies and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reader-facing name of a source identifier.
pub fn display_source(name: &str) -> &str {
    SOURCE_DISPLAY
        .iter()
        .find(|(id, _)| *id == name)
        .map(|(_, display)| *display)
        .unwrap_or(name)
}

/// Join source identifiers for display: `네이버뉴스 · BBC`.
pub fn format_sources<S: AsRef<str>>(sources: &[S]) -> String {
    sources
        .iter()
        .map(|s| display_source(s.as_ref()))
        .collect::<Vec<_>>()
        .join(" · ")
}

/// Korean long date in KST, e.g. `2026년 1월 29일 목요일`.
pub fn korean_date_display(date: DateTime<Utc>) -> String {
    // Korea has no daylight saving time.
    let kst = FixedOffset::east_opt(9 * 3600).unwrap();
    let local = date.with_timezone(&kst);
    format!(
        "{}년 {}월 {}일 {}",
        local.year(),
        local.month(),
        local.day(),
        KOREAN_WEEKDAYS[local.weekday().num_days_from_monday() as usize]
    )
}

/// Truncate a string for logging purposes.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let head: String = chars.by_ref().take(max).collect();
    let rest = chars.count();
    if rest == 0 {
        head
    } else {
        format!("{head}…(+{rest} chars)")
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error + Send + Sync>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_sentence_short_text_untouched() {
        assert_eq!(truncate_sentence("안녕하세요", 100), "안녕하세요");
        assert_eq!(truncate_sentence("", 100), "");
    }

    #[test]
    fn test_truncate_sentence_cuts_at_sentence_end() {
        let text = "첫 문장입니다. 두 번째 문장이 이어지고 있다. 세 번째 문장은 아주 길게 계속된다";
        let out = truncate_sentence(text, 30);
        assert_eq!(out, "첫 문장입니다. 두 번째 문장이 이어지고 있다.");
    }

    #[test]
    fn test_truncate_sentence_falls_back_to_ellipsis() {
        let text = "a".repeat(50);
        let out = truncate_sentence(&text, 10);
        assert_eq!(out, format!("{}…", "a".repeat(10)));
    }

    #[test]
    fn test_truncate_sentence_ignores_early_sentence_end() {
        let text = format!("Hi. {}", "b".repeat(40));
        let out = truncate_sentence(&text, 20);
        assert!(out.ends_with('…'));
        assert_eq!(out.chars().count(), 21);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert(\"xss\")</script>"),
            "&lt;script&gt;alert(&quot;xss&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("Tom & Jerry's"), "Tom &amp; Jerry&#39;s");
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn test_format_sources() {
        assert_eq!(display_source("네이버"), "네이버뉴스");
        assert_eq!(display_source("BBC"), "BBC");
        assert_eq!(format_sources(&["네이버", "SBS", "CNN"]), "네이버뉴스 · SBS뉴스 · CNN");
        let empty: [&str; 0] = [];
        assert_eq!(format_sources(&empty), "");
    }

    #[test]
    fn test_korean_date_display_uses_kst() {
        // 2026-01-28 20:00 UTC is already Thursday the 29th in Seoul.
        let date = Utc.with_ymd_and_hms(2026, 1, 28, 20, 0, 0).unwrap();
        assert_eq!(korean_date_display(date), "2026년 1월 29일 목요일");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 100), "short");
        let long = "가".repeat(50);
        assert_eq!(truncate_for_log(&long, 10), format!("{}…(+40 chars)", "가".repeat(10)));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_directory() {
        let dir = std::env::temp_dir().join(format!("news_digest_writable_{}", std::process::id()));
        ensure_writable_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
