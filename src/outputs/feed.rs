//! RSS 2.0 feed of the newest digest (`feed.xml`).
//!
//! One `<item>` per selected story. The item link is the story's first source
//! link; the description carries the sources and the summary.

use crate::models::{Digest, MergedArticle};
use crate::utils::format_sources;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

pub const FEED_FILE: &str = "feed.xml";
const FEED_TITLE: &str = "오늘의 인기 뉴스";
const FEED_DESCRIPTION: &str = "여러 매체의 헤드라인을 모아 중복을 합친 일일 뉴스 다이제스트";

fn write_text_element<W: Write>(w: &mut Writer<W>, name: &str, text: &str) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn item_description(article: &MergedArticle) -> String {
    let sources = format_sources(article.sources());
    if article.summary().is_empty() {
        format!("출처: {sources}")
    } else {
        format!("출처: {sources}\n{}", article.summary())
    }
}

/// Serialize the digest as an RSS 2.0 document. `site_link` is the channel link.
pub fn digest_to_rss(digest: &Digest, site_link: &str) -> io::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut rss_start = BytesStart::new("rss");
    rss_start.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss_start))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;
    write_text_element(&mut writer, "title", &format!("{FEED_TITLE} - {}", digest.date_display))?;
    write_text_element(&mut writer, "link", site_link)?;
    write_text_element(&mut writer, "description", FEED_DESCRIPTION)?;
    write_text_element(&mut writer, "language", "ko")?;
    write_text_element(&mut writer, "pubDate", &digest.date.to_rfc2822())?;

    for article in &digest.articles {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        let title = if article.is_hot() {
            format!("[HOT] {}", article.title())
        } else {
            article.title().to_string()
        };
        write_text_element(&mut writer, "title", &title)?;
        if let Some(link) = article.links().first() {
            write_text_element(&mut writer, "link", &link.url)?;
        }
        write_text_element(&mut writer, "description", &item_description(article))?;
        write_text_element(&mut writer, "category", article.category().as_str())?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;
    Ok(writer.into_inner())
}

/// Write `feed.xml` into the archive directory.
#[instrument(level = "info", skip_all, fields(archive_dir = %archive_dir.display()))]
pub async fn write_feed(
    digest: &Digest,
    archive_dir: &Path,
    site_link: &str,
) -> Result<PathBuf, Box<dyn Error + Send + Sync>> {
    let xml = digest_to_rss(digest, site_link)?;
    fs::create_dir_all(archive_dir).await?;
    let path = archive_dir.join(FEED_FILE);
    fs::write(&path, xml).await?;
    info!(path = %path.display(), items = digest.articles.len(), "Wrote RSS feed");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::json::tests::sample_digest;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_feed_is_readable_rss() {
        let digest = sample_digest(Utc.with_ymd_and_hms(2026, 1, 29, 1, 0, 0).unwrap());
        let xml = digest_to_rss(&digest, "https://news.example.com").unwrap();

        let channel = rss::Channel::read_from(&xml[..]).unwrap();
        assert_eq!(channel.title(), "오늘의 인기 뉴스 - 2026년 1월 29일 목요일");
        assert_eq!(channel.link(), "https://news.example.com");
        assert_eq!(channel.items().len(), 2);

        let hot = &channel.items()[0];
        assert_eq!(hot.title(), Some("[HOT] 폭설 피해 확산"));
        assert_eq!(hot.link(), Some("https://news.naver.com/a"));
        assert_eq!(
            hot.description(),
            Some("출처: 네이버뉴스 · SBS뉴스\n전국에 대설 경보가 내려졌다.")
        );

        let cold = &channel.items()[1];
        assert_eq!(cold.title(), Some("Ceasefire <talks> resume"));
        assert_eq!(cold.link(), None);
        assert_eq!(cold.categories()[0].name(), "global");
    }

    #[test]
    fn test_feed_escapes_markup() {
        let digest = sample_digest(Utc.with_ymd_and_hms(2026, 1, 29, 1, 0, 0).unwrap());
        let xml = String::from_utf8(digest_to_rss(&digest, "https://x").unwrap()).unwrap();
        assert!(xml.contains("Ceasefire &lt;talks&gt; resume"));
    }
}
