//! Email body of the digest.
//!
//! One self-contained HTML document with inline styles. HOT stories come
//! first, then one section per category of the remaining stories, followed
//! by the counter-view
//! section and a footer listing the sources that answered. Every piece of
//! article text is HTML-escaped. Sending the mail is left to the caller.

use crate::models::{Category, CounterView, Digest, MergedArticle};
use crate::utils::{escape_html, format_sources};
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

const STYLE: &str = "body{font-family:'Segoe UI',Arial,sans-serif;line-height:1.6;color:#333;max-width:600px;margin:0 auto}
.header{background:linear-gradient(135deg,#667eea 0%,#764ba2 100%);color:#fff;padding:20px;text-align:center;border-radius:10px 10px 0 0}
.header h1{margin:0;font-size:24px}.header p{margin:5px 0 0;opacity:.9;font-size:14px}
.content{padding:20px;background:#f9f9f9}
.news-item{background:#fff;padding:15px;margin-bottom:10px;border-radius:8px;border-left:4px solid #667eea}
.news-item.hot{border-left-color:#dc3545;background:#fff5f5}
.hot-badge{background:#dc3545;color:#fff;padding:2px 8px;border-radius:10px;font-size:11px;font-weight:700}
.news-title{font-size:16px;font-weight:700;margin-bottom:5px}
.news-title a{color:#333;text-decoration:none}
.news-sources{color:#666;font-size:12px;margin-bottom:5px}
.news-summary{color:#555;font-size:13px}
.section-title{font-size:18px;font-weight:700;color:#667eea;margin:20px 0 10px;padding-bottom:5px;border-bottom:2px solid #667eea}
.stats{display:flex;justify-content:space-around;margin-bottom:15px}
.stat{text-align:center}.stat-number{font-size:24px;font-weight:700;color:#667eea}
.stat-label{font-size:12px;color:#666}
.footer{background:#333;color:#aaa;padding:15px;text-align:center;font-size:12px;border-radius:0 0 10px 10px}";

/// Visual variant of a story card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Card {
    Hot,
    Domestic,
    Tech,
    Economy,
    Analysis,
    Global,
}

impl Card {
    fn class(self) -> &'static str {
        if self == Card::Hot { " hot" } else { "" }
    }

    fn border_color(self) -> Option<&'static str> {
        match self {
            Card::Tech => Some("#8b5cf6"),
            Card::Economy => Some("#f59e0b"),
            Card::Analysis => Some("#28a745"),
            Card::Global => Some("#17a2b8"),
            _ => None,
        }
    }

    fn summary_limit(self) -> usize {
        if self == Card::Hot { 100 } else { 150 }
    }
}

/// Render the email body. `refresh_url` adds a button that triggers a new run.
pub fn digest_to_email_html(digest: &Digest, refresh_url: Option<&str>) -> String {
    let hot: Vec<&MergedArticle> = digest.articles.iter().filter(|a| a.is_hot()).collect();
    let cold = |category: Category| -> Vec<&MergedArticle> {
        digest
            .articles
            .iter()
            .filter(|a| !a.is_hot() && a.category() == category)
            .collect()
    };

    let mut html = String::new();
    write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"><style>\n{STYLE}\n</style></head><body>"
    )
    .unwrap();
    write!(
        html,
        "<div class=\"header\"><h1>📰 오늘의 인기 뉴스</h1><p>{}</p></div><div class=\"content\">",
        escape_html(&digest.date_display)
    )
    .unwrap();
    write!(
        html,
        "<div class=\"stats\">\
<div class=\"stat\"><div class=\"stat-number\">{}</div><div class=\"stat-label\">전체 뉴스</div></div>\
<div class=\"stat\"><div class=\"stat-number\" style=\"color:#dc3545\">{}</div><div class=\"stat-label\">HOT 뉴스</div></div>\
</div>",
        digest.articles.len(),
        hot.len()
    )
    .unwrap();

    if !hot.is_empty() {
        section_title(&mut html, "🔥 HOT 뉴스", Some("#dc3545"));
        for article in &hot {
            news_item(&mut html, article, Card::Hot, None);
        }
    }
    for (category, card, title) in [
        (Category::Domestic, Card::Domestic, "🇰🇷 국내 주요 뉴스"),
        (Category::Tech, Card::Tech, "💻 테크"),
        (Category::Economy, Card::Economy, "💰 경제"),
        (Category::Analysis, Card::Analysis, "📊 심층 분석 기사"),
        (Category::Global, Card::Global, "🌍 글로벌 핫뉴스"),
    ] {
        let articles = cold(category);
        if articles.is_empty() {
            continue;
        }
        section_title(&mut html, title, card.border_color());
        for (i, article) in articles.iter().enumerate() {
            news_item(&mut html, article, card, Some(i + 1));
        }
    }

    let views: Vec<&CounterView> = digest.articles.iter().filter_map(|a| a.counter_view()).collect();
    counter_view_section(&mut html, &views);
    html.push_str("</div>");

    if let Some(url) = refresh_url {
        write!(
            html,
            "<div style=\"text-align:center;padding:20px;background:#f0f0f0\">\
<a href=\"{}\" style=\"display:inline-block;background:linear-gradient(135deg,#667eea 0%,#764ba2 100%);color:#fff;padding:15px 30px;text-decoration:none;border-radius:25px;font-weight:700;font-size:16px\">🔄 최신 뉴스 새로고침</a>\
<p style=\"margin-top:10px;font-size:12px;color:#888\">클릭하면 1~2분 후 새 뉴스가 도착합니다</p></div>",
            escape_html(url)
        )
        .unwrap();
    }

    write!(
        html,
        "<div class=\"footer\"><p>이 이메일은 자동으로 발송되었습니다.</p><p>수집 소스: {}</p></div></body></html>",
        escape_html(&format_sources(&digest.active_sources))
    )
    .unwrap();
    html
}

fn section_title(html: &mut String, title: &str, color: Option<&str>) {
    match color {
        Some(c) => write!(
            html,
            "<div class=\"section-title\" style=\"color:{c};border-bottom-color:{c}\">{title}</div>"
        )
        .unwrap(),
        None => write!(html, "<div class=\"section-title\">{title}</div>").unwrap(),
    }
}

fn news_item(html: &mut String, article: &MergedArticle, card: Card, index: Option<usize>) {
    let link = article
        .links()
        .first()
        .map(|l| escape_html(&l.url))
        .unwrap_or_else(|| "#".to_string());
    let prefix = index.map(|i| format!("{i}. ")).unwrap_or_default();
    let style = card
        .border_color()
        .map(|c| format!(" style=\"border-left-color:{c}\""))
        .unwrap_or_default();

    write!(html, "<div class=\"news-item{}\"{style}><div class=\"news-title\">", card.class()).unwrap();
    if card == Card::Hot {
        html.push_str("<span class=\"hot-badge\">HOT</span> ");
    }
    write!(
        html,
        "<a href=\"{link}\" target=\"_blank\">{prefix}{}</a></div>",
        escape_html(article.title())
    )
    .unwrap();
    write!(
        html,
        "<div class=\"news-sources\">출처: {}</div>",
        escape_html(&format_sources(article.sources()))
    )
    .unwrap();
    if !article.summary().is_empty() {
        write!(
            html,
            "<div class=\"news-summary\">{}</div>",
            escape_html(&clip(article.summary(), card.summary_limit()))
        )
        .unwrap();
    }
    html.push_str("</div>");
}

/// First `max` characters, with `...` when anything was cut.
fn clip(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn counter_view_section(html: &mut String, views: &[&CounterView]) {
    if views.is_empty() {
        return;
    }
    html.push_str(
        "<div style=\"margin: 25px 0; padding: 20px; background: linear-gradient(135deg, #f5f7fa 0%, #e8ecf1 100%); border-left: 4px solid #6c5ce7; border-radius: 8px;\">\
<h2 style=\"color: #6c5ce7; margin: 0 0 8px 0; font-size: 18px;\">🎭 다른 관점에서 보기</h2>\
<p style=\"color: #666; font-size: 13px; margin: 0 0 20px 0;\">확증편향을 벗어나 다양한 시각을 경험해보세요</p>",
    );

    for view in views {
        let arguments: String = view
            .counter_arguments
            .iter()
            .map(|arg| {
                format!(
                    "<li><strong>{}</strong> - {}</li>",
                    escape_html(&arg.point),
                    escape_html(&arg.explanation)
                )
            })
            .collect();
        write!(
            html,
            "<div style=\"background: white; padding: 15px; border-radius: 6px; margin-bottom: 15px; border: 1px solid #e0e0e0;\">\
<h3 style=\"color: #2d3436; margin: 0 0 10px 0; font-size: 15px;\">{}\"{}\"</h3>\
<div style=\"color: #636e72; font-size: 14px; line-height: 1.6;\">\
<p style=\"margin: 0 0 10px 0;\"><strong>핵심 주장:</strong> {}</p>\
<p style=\"color: #d63031; margin: 0 0 5px 0;\"><strong>🤔 반론:</strong></p>\
<ul style=\"margin: 0 0 10px 0; padding-left: 20px;\">{arguments}</ul>\
<p style=\"color: #0984e3; margin: 0;\"><strong>💡 대안적 관점:</strong> {}</p></div></div>",
            if view.is_hot { "🔥 " } else { "📰 " },
            escape_html(&view.original_title),
            escape_html(&view.original_claim),
            escape_html(&view.alternative_viewpoint)
        )
        .unwrap();
    }

    html.push_str(
        "<p style=\"color: #b2bec3; font-size: 11px; margin: 15px 0 0 0; text-align: center;\">\
⚠️ AI 분석 기반 | 투자·의사결정 참고용이 아닙니다</p></div>",
    );
}

/// Write `news_<date>.html` into the archive directory.
#[instrument(level = "info", skip_all, fields(archive_dir = %archive_dir.display()))]
pub async fn write_email_html(
    digest: &Digest,
    archive_dir: &Path,
    refresh_url: Option<&str>,
) -> Result<PathBuf, Box<dyn Error + Send + Sync>> {
    let html = digest_to_email_html(digest, refresh_url);
    fs::create_dir_all(archive_dir).await?;
    let path = archive_dir.join(format!("news_{}.html", digest.date_stamp()));
    fs::write(&path, html).await?;
    info!(path = %path.display(), "Wrote email HTML");
    Ok(path)
}
