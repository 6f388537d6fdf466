//! Counter-perspective pass over the selected stories.
//!
//! A handful of stories (hot ones first) are sent to an analyst model that
//! answers with the story's core claim, two rebuttals and an alternative
//! viewpoint. The reply is matched back onto the story by exact title.
//!
//! Generation is best effort. A story whose request or reply fails is left
//! without a counter view; nothing here can abort a digest.

use crate::error::PerspectiveError;
use crate::models::{Category, CounterArgument, CounterView, MergedArticle};
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::error::Error;
use tracing::{debug, info, instrument, warn};

/// Stories analysed per digest unless configured otherwise.
pub const DEFAULT_MAX_ITEMS: usize = 3;

/// Instructions for the analyst model. The reply must be a single JSON object.
pub const ANALYST_PROMPT: &str = r#"당신은 비판적 사고를 돕는 분석가입니다.
주어진 뉴스에 대해 반대 관점을 제시해주세요.

규칙:
1. 뉴스의 핵심 주장을 한 문장으로 파악
2. 해당 주장에 대한 합리적인 반론 2개 제시
3. 대안적 관점 또는 누락된 맥락 1개 제시
4. 감정적이지 않고 논리적으로 분석
5. "틀렸다"가 아니라 "다른 관점도 있다"는 톤 유지
6. 한국어로 응답

반드시 아래 JSON 형식으로만 응답:
{
  "originalClaim": "핵심 주장 한 문장",
  "counterArguments": [
    {"point": "반론1 제목", "explanation": "설명 1-2문장"},
    {"point": "반론2 제목", "explanation": "설명 1-2문장"}
  ],
  "alternativeViewpoint": "대안적 관점 1-2문장"
}"#;

static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Produces a counter view for one story.
pub trait PerspectiveGenerator {
    async fn generate(&self, article: &MergedArticle) -> Result<CounterView, Box<dyn Error>>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AnalystReply {
    original_claim: String,
    counter_arguments: Vec<CounterArgument>,
    alternative_viewpoint: String,
}

/// Stories worth analysing: hot ones first, then non-hot non-global ones.
pub fn select_for_analysis(articles: &[MergedArticle], max: usize) -> Vec<&MergedArticle> {
    let hot = articles.iter().filter(|a| a.is_hot());
    let local = articles
        .iter()
        .filter(|a| !a.is_hot() && a.category() != Category::Global);
    hot.chain(local).take(max).collect()
}

/// The full request text for one story.
pub fn build_prompt(article: &MergedArticle) -> String {
    let summary = if article.summary().is_empty() {
        "(요약 없음)"
    } else {
        article.summary()
    };
    format!(
        "{ANALYST_PROMPT}\n\n뉴스 제목: {}\n요약: {summary}\n\n위 뉴스에 대한 반대 관점을 분석해주세요.",
        article.title()
    )
}

/// Read the first `{...}` span of a model reply as a counter view for `article`.
///
/// Missing fields default to empty. Title and hotness come from the story,
/// not from the reply.
pub fn parse_counter_view(
    reply: &str,
    article: &MergedArticle,
) -> Result<CounterView, PerspectiveError> {
    let json = JSON_OBJECT
        .find(reply)
        .ok_or(PerspectiveError::NoJson)?
        .as_str();
    let parsed: AnalystReply = serde_json::from_str(json)?;

    Ok(CounterView {
        original_title: article.title().to_string(),
        original_claim: parsed.original_claim,
        counter_arguments: parsed.counter_arguments,
        alternative_viewpoint: parsed.alternative_viewpoint,
        is_hot: article.is_hot(),
    })
}

/// Generate counter views for the selected stories concurrently.
///
/// Failed generations are logged and dropped.
#[instrument(level = "info", skip_all, fields(candidates = articles.len(), max_items = max_items))]
pub async fn generate_batch<G: PerspectiveGenerator>(
    generator: &G,
    articles: &[MergedArticle],
    max_items: usize,
) -> Vec<CounterView> {
    let selected = select_for_analysis(articles, max_items);
    if selected.is_empty() {
        debug!("No stories eligible for analysis");
        return Vec::new();
    }

    let results = join_all(selected.iter().map(|article| generator.generate(article))).await;

    let views: Vec<CounterView> = selected
        .iter()
        .zip(results)
        .filter_map(|(article, result)| match result {
            Ok(view) => Some(view),
            Err(e) => {
                warn!(title = %article.title(), error = %e, "Counter view generation failed");
                None
            }
        })
        .collect();
    info!(requested = selected.len(), generated = views.len(), "Counter views generated");
    views
}

/// Attach each view to the first story whose title equals `original_title`.
///
/// Returns the number of views attached. Views without a matching story are
/// dropped.
pub fn attach_counter_views(articles: &mut [MergedArticle], views: Vec<CounterView>) -> usize {
    let mut attached = 0;
    for view in views {
        match articles.iter_mut().find(|a| a.title() == view.original_title) {
            Some(article) => {
                article.set_counter_view(view);
                attached += 1;
            }
            None => debug!(title = %view.original_title, "No story matches counter view"),
        }
    }
    attached
}
