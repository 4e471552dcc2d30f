use crate::infra::{deserialize_optional_date, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use staffing_reports::error::AppError;
use staffing_reports::workflows::board::wire::{
    move_events_from_wire, snapshot_from_wire, WireAction, WireList,
};
use staffing_reports::workflows::reports::{preview, ReportInputs, ReportPreview, RunSummary};
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PreviewRequest {
    pub(crate) snapshot: Vec<WireList>,
    #[serde(default)]
    pub(crate) actions: Vec<WireAction>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PreviewResponse {
    pub(crate) today: NaiveDate,
    pub(crate) reports: Vec<ReportPreview>,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/reports/run", post(run_reports_endpoint))
        .route("/api/v1/reports/preview", post(preview_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn run_reports_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<RunSummary>, AppError> {
    let pipeline = state.pipeline.get()?;
    let summary = pipeline.run().await?;
    info!(
        failures = summary.has_failures(),
        dry_run = summary.dry_run,
        "report run triggered over http"
    );
    Ok(Json(summary))
}

/// Every action in the body counts as recent; the caller decides the window.
pub(crate) async fn preview_endpoint(
    Json(payload): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let PreviewRequest {
        snapshot,
        actions,
        today,
    } = payload;

    let snapshot = snapshot_from_wire(snapshot)?;
    let moves = move_events_from_wire(actions)?;
    let today = today.unwrap_or_else(|| Utc::now().date_naive());

    let reports = preview(ReportInputs {
        snapshot: &snapshot,
        moves: &moves,
        today,
    });
    Ok(Json(PreviewResponse { today, reports }))
}
