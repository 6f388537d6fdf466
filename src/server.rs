//! HTTP API over the digest archive.
//!
//! | Method | Path | Answer |
//! |--------|------|--------|
//! | GET | `/api/digest/latest` | cached digest, else `latest-digest.json`, else 404 |
//! | POST | `/api/digest/run` | collect and rank now (no LLM), write outputs, refresh cache |
//! | GET | `/api/archive` | archived digests, newest first |
//! | GET | `/api/archive/{date}` | one archived digest; 400 on a malformed date |
//! | GET | `/api/keywords/trend` | top keywords over the last 14 snapshots |
//! | GET | `/api/weekly-summary` | totals over the last 7 snapshots |
//!
//! Only one run executes at a time; a second `POST` while one is in flight
//! gets 409.

use crate::cache::DigestCache;
use crate::config::Settings;
use crate::models::{Digest, MergedArticle};
use crate::outputs::{self, json, OutputOptions};
use crate::pipeline::{build_digest, gather};
use crate::scrapers::NewsSource;
use crate::trends::{self, SUMMARY_DAYS, SUMMARY_TOP, TREND_DAYS, TREND_TOP};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Paths and tuning shared by every request.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub settings: Settings,
    pub archive_dir: PathBuf,
    pub today_path: Option<PathBuf>,
    pub refresh_url: Option<String>,
    pub site_url: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    cache: Arc<DigestCache>,
    client: Client,
    sources: Arc<Vec<Box<dyn NewsSource>>>,
    run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: ServerConfig, client: Client, sources: Vec<Box<dyn NewsSource>>) -> Self {
        Self {
            config: Arc::new(config),
            cache: Arc::new(DigestCache::new()),
            client,
            sources: Arc::new(sources),
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunFiles {
    date_format: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunResponse<'a> {
    success: bool,
    message: &'a str,
    headlines: &'a [MergedArticle],
    files: RunFiles,
}

fn run_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "success": false,
            "message": "뉴스 수집 중 오류가 발생했습니다.",
        })),
    )
        .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/digest/latest", get(latest_digest))
        .route("/api/digest/run", post(run_digest))
        .route("/api/archive", get(archive_list))
        .route("/api/archive/list", get(archive_list))
        .route("/api/archive/{date}", get(archive_by_date))
        .route("/api/keywords/trend", get(keyword_trend))
        .route("/api/weekly-summary", get(weekly_summary))
        .with_state(state)
}

/// Bind `0.0.0.0:port` and serve until the process is stopped.
///
/// # Arguments
///
/// * `state` - Shared configuration, cache and source registry
/// * `port` - TCP port to listen on, on all interfaces
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server loop fails.
pub async fn serve(state: AppState, port: u16) -> Result<(), Box<dyn Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn latest_digest(State(state): State<AppState>) -> Response {
    if let Some(digest) = state.cache.latest() {
        return Json(digest.as_ref()).into_response();
    }

    match json::read_latest(&state.config.archive_dir).await {
        Ok(Some(digest)) => {
            let digest = state.cache.store(digest);
            Json(digest.as_ref()).into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "아직 수집된 다이제스트가 없습니다."),
        Err(e) => {
            warn!(error = %e, "Stored latest digest is unreadable");
            error_response(StatusCode::NOT_FOUND, "아직 수집된 다이제스트가 없습니다.")
        }
    }
}

async fn run_digest(State(state): State<AppState>) -> Response {
    let Ok(_guard) = state.run_lock.try_lock() else {
        return error_response(StatusCode::CONFLICT, "이미 뉴스 수집이 진행 중입니다.");
    };
    info!("Digest run requested");

    let collection = gather(&state.client, &state.sources).await;
    let digest: Digest = match build_digest(collection, &state.config.settings, Utc::now()) {
        Ok(digest) => digest,
        Err(e) => {
            error!(error = %e, "Digest run failed");
            return run_failed();
        }
    };

    let config = &state.config;
    let written = outputs::write_all(
        &digest,
        OutputOptions {
            archive_dir: &config.archive_dir,
            today_path: config.today_path.as_deref(),
            refresh_url: config.refresh_url.as_deref(),
            site_url: config.site_url.as_deref(),
        },
    )
    .await;
    if written.is_empty() {
        error!(archive_dir = %config.archive_dir.display(), "Digest run wrote no files");
        return run_failed();
    }

    let digest = state.cache.store(digest);
    Json(RunResponse {
        success: true,
        message: "뉴스가 성공적으로 수집되었습니다!",
        headlines: &digest.articles,
        files: RunFiles {
            date_format: digest.date_stamp(),
        },
    })
    .into_response()
}

async fn archive_list(State(state): State<AppState>) -> Response {
    match json::list_archive(&state.config.archive_dir).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list archive");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "아카이브 목록 읽기 실패")
        }
    }
}

async fn archive_by_date(State(state): State<AppState>, Path(date): Path<String>) -> Response {
    if json::parse_date_stamp(&date).is_none() {
        return error_response(StatusCode::BAD_REQUEST, "잘못된 날짜 형식");
    }
    match json::read_archived(&state.config.archive_dir, &date).await {
        Ok(Some(digest)) => Json(digest).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "해당 날짜 다이제스트 없음"),
        Err(e) => {
            error!(%date, error = %e, "Failed to read archived digest");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "파일 읽기 실패")
        }
    }
}

async fn keyword_trend(State(state): State<AppState>) -> Response {
    match json::read_recent(&state.config.archive_dir, TREND_DAYS).await {
        Ok(days) => Json(trends::keyword_trend(&days, TREND_TOP)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to read archive for keyword trend");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "아카이브 읽기 실패")
        }
    }
}

async fn weekly_summary(State(state): State<AppState>) -> Response {
    match json::read_recent(&state.config.archive_dir, SUMMARY_DAYS).await {
        Ok(days) => Json(trends::weekly_summary(&days, SUMMARY_TOP)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to read archive for weekly summary");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "아카이브 읽기 실패")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, RawArticle};
    use crate::outputs::json::tests::{sample_digest, temp_dir};
    use crate::scrapers::FetchError;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::TimeZone;
    use tower::ServiceExt;

    struct FixedSource;

    #[async_trait]
    impl NewsSource for FixedSource {
        fn name(&self) -> &str {
            "BBC"
        }

        fn category(&self) -> Category {
            Category::Global
        }

        async fn fetch(&self, _client: &Client) -> Result<Vec<RawArticle>, FetchError> {
            Ok(vec![
                RawArticle::new("Markets rally worldwide", "BBC", Category::Global),
                RawArticle::new("Markets rally worldwide today", "CNN", Category::Global),
            ])
        }
    }

    fn state(tag: &str, sources: Vec<Box<dyn NewsSource>>) -> (AppState, PathBuf) {
        let dir = temp_dir(tag);
        (state_at(dir.clone(), sources), dir)
    }

    fn state_at(archive_dir: PathBuf, sources: Vec<Box<dyn NewsSource>>) -> AppState {
        let config = ServerConfig {
            settings: Settings::default(),
            archive_dir,
            today_path: None,
            refresh_url: None,
            site_url: None,
        };
        AppState::new(config, Client::new(), sources)
    }

    async fn call(state: &AppState, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_latest_is_404_before_any_run() {
        let (state, _dir) = state("server_empty", vec![]);
        let (status, body) = call(&state, "GET", "/api/digest/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_latest_falls_back_to_file() {
        let (state, dir) = state("server_file", vec![]);
        let digest = sample_digest(Utc.with_ymd_and_hms(2026, 1, 29, 1, 0, 0).unwrap());
        json::write_digest(&digest, &dir).await.unwrap();

        let (status, body) = call(&state, "GET", "/api/digest/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dateDisplay"], "2026년 1월 29일 목요일");
        assert!(state.cache.latest().is_some());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_run_then_read_back() {
        let (state, dir) = state("server_run", vec![Box::new(FixedSource)]);

        let (status, body) = call(&state, "POST", "/api/digest/run").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["headlines"].as_array().unwrap().len(), 1);
        assert_eq!(body["headlines"][0]["isHot"], true);
        let date = body["files"]["dateFormat"].as_str().unwrap().to_string();

        let (status, latest) = call(&state, "GET", "/api/digest/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(latest["articles"][0]["sources"], serde_json::json!(["BBC", "CNN"]));

        let (status, list) = call(&state, "GET", "/api/archive").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list[0]["date"], date.as_str());
        assert_eq!(list[0]["hotCount"], 1);

        let (status, archived) = call(&state, "GET", &format!("/api/archive/{date}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(archived["articles"].as_array().unwrap().len(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_run_with_no_sources_is_500() {
        let (state, _dir) = state("server_fail", vec![]);
        let (status, body) = call(&state, "POST", "/api/digest/run").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_archive_date_validation() {
        let (state, _dir) = state("server_dates", vec![]);
        let (status, _) = call(&state, "GET", "/api/archive/2026-1-29").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(&state, "GET", "/api/archive/yesterday").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(&state, "GET", "/api/archive/2026-01-29").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_archive_list_empty_directory() {
        let (state, _dir) = state("server_list", vec![]);
        let (status, body) = call(&state, "GET", "/api/archive").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_run_that_writes_nothing_is_500() {
        // A regular file where the archive directory should be makes every writer fail.
        let blocker = temp_dir("server_unwritable");
        std::fs::write(&blocker, "not a directory").unwrap();
        let state = state_at(blocker.clone(), vec![Box::new(FixedSource)]);

        let (status, body) = call(&state, "POST", "/api/digest/run").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(state.cache.latest().is_none());
        let _ = std::fs::remove_file(&blocker);
    }

    #[tokio::test]
    async fn test_keyword_trend_and_weekly_summary() {
        let (state, dir) = state("server_trends", vec![]);
        for day in [28, 29] {
            let digest = sample_digest(Utc.with_ymd_and_hms(2026, 1, day, 1, 0, 0).unwrap());
            json::write_digest(&digest, &dir).await.unwrap();
        }

        let (status, trend) = call(&state, "GET", "/api/keywords/trend").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(trend["dates"], serde_json::json!(["2026-01-28", "2026-01-29"]));
        assert_eq!(trend["keywords"]["폭설"]["total"], 2);
        assert_eq!(trend["keywords"]["폭설"]["byDate"], serde_json::json!([1, 1]));

        let (status, summary) = call(&state, "GET", "/api/weekly-summary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["totalArticles"], 4);
        assert_eq!(summary["hotArticles"], 2);
        assert_eq!(summary["sourceCounts"]["BBC"], 2);
        assert_eq!(summary["dailyCounts"][1], serde_json::json!({"date": "2026-01-29", "count": 2, "hot": 1}));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_analysis_endpoints_on_missing_archive() {
        let (state, _dir) = state("server_trends_empty", vec![]);
        let (status, trend) = call(&state, "GET", "/api/keywords/trend").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(trend, serde_json::json!({"dates": [], "keywords": {}}));

        let (status, summary) = call(&state, "GET", "/api/weekly-summary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["totalArticles"], 0);
        assert_eq!(summary["dailyCounts"], serde_json::json!([]));
    }
}
