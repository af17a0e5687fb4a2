//! services/api/src/web/summary.rs
//!
//! Period-summary endpoints: the AI-generated report over a computed date
//! window, and the deterministic local Markdown export of the same event
//! set (no AI involved).

use axum::{
    extract::{Extension, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use event_journal_core::domain::PeriodEvent;
use event_journal_core::export::{period_export_markdown, summary_report_markdown};
use event_journal_core::period::{format_date_range, period_window, PeriodKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct SummaryRequest {
    /// day, week, month or year.
    #[schema(value_type = String)]
    pub period: PeriodKind,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub period: PeriodKind,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    /// The AI-generated report body.
    pub summary: String,
    /// The report wrapped with a download header, ready to save as `.md`.
    pub report_markdown: String,
    pub event_count: usize,
    pub date_range: String,
}

fn internal_error(context: &str, e: impl std::fmt::Debug) -> (StatusCode, String) {
    error!("{}: {:?}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "操作失败，请稍后重试".to_string(),
    )
}

const NO_DATA: (StatusCode, &str) = (StatusCode::NOT_FOUND, "该时间段内没有事件记录");

/// Generate an AI summary report over the caller's events in the period.
#[utoipa::path(
    post,
    path = "/summary",
    request_body = SummaryRequest,
    responses(
        (status = 200, description = "Generated report", body = SummaryResponse),
        (status = 404, description = "No events in the period"),
        (status = 502, description = "Summary generation failed")
    )
)]
pub async fn generate_summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, (StatusCode, String)> {
    let (start, end) = period_window(req.period, Utc::now());

    let events = state
        .store
        .events_with_records_by_date_range(user_id, start, end)
        .await
        .map_err(|e| internal_error("Failed to load period events", e))?;

    if events.is_empty() {
        return Err((NO_DATA.0, NO_DATA.1.to_string()));
    }

    let period_events: Vec<PeriodEvent> = events.iter().map(PeriodEvent::from_event).collect();
    let start_label = start.format("%Y/%m/%d").to_string();
    let end_label = end.format("%Y/%m/%d").to_string();

    let summary = state
        .period_llm
        .summarize_period(req.period, &start_label, &end_label, &period_events)
        .await
        .map_err(|e| {
            error!("Failed to generate period summary: {:?}", e);
            (
                StatusCode::BAD_GATEWAY,
                "无法生成总结报告，请稍后重试".to_string(),
            )
        })?;

    let date_range = format_date_range(start, end);
    let report_markdown = summary_report_markdown(req.period, &date_range, events.len(), &summary);

    Ok(Json(SummaryResponse {
        summary,
        report_markdown,
        event_count: events.len(),
        date_range,
    }))
}

/// Download the deterministic Markdown export of all events in the period.
#[utoipa::path(
    get,
    path = "/summary/export",
    params(("period" = String, Query, description = "day, week, month or year")),
    responses(
        (status = 200, description = "Markdown export", content_type = "text/markdown"),
        (status = 404, description = "No events in the period")
    )
)]
pub async fn export_period_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (start, end) = period_window(query.period, Utc::now());

    let events = state
        .store
        .events_with_records_by_date_range(user_id, start, end)
        .await
        .map_err(|e| internal_error("Failed to load period events", e))?;

    if events.is_empty() {
        return Err((NO_DATA.0, NO_DATA.1.to_string()));
    }

    let body = period_export_markdown(query.period, &format_date_range(start, end), &events);
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        body,
    ))
}
