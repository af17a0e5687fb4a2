//! services/api/src/web/records.rs
//!
//! Handlers for progress records: appending (with AI normalization),
//! editing a record's summary, and deletion. All record mutations are
//! rejected once the parent event is closed.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use event_journal_core::domain::{Event, EventStatus, NewEventRecord};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::events::{load_owned_event, EventRecordDto};
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct AddRecordRequest {
    pub content: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateRecordRequest {
    pub ai_summary: String,
}

fn internal_error(context: &str, e: impl std::fmt::Debug) -> (StatusCode, String) {
    error!("{}: {:?}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "操作失败，请稍后重试".to_string(),
    )
}

fn reject_closed(event: &Event) -> Result<(), (StatusCode, String)> {
    if event.status == EventStatus::Closed {
        return Err((
            StatusCode::CONFLICT,
            "已闭环的事件不能再修改进展".to_string(),
        ));
    }
    Ok(())
}

/// Resolves a record to its parent event, enforcing ownership.
async fn load_record_event(
    state: &AppState,
    user_id: Uuid,
    record_id: Uuid,
) -> Result<(Uuid, Event), (StatusCode, String)> {
    let record = state
        .store
        .record_by_id(record_id)
        .await
        .map_err(|e| internal_error("Failed to load record", e))?
        .ok_or((StatusCode::NOT_FOUND, "进展记录不存在".to_string()))?;

    let event = load_owned_event(state, user_id, record.event_id).await?;
    Ok((record.id, event))
}

/// Append a progress record to an event.
///
/// The raw text is first normalized by the AI; only when that succeeds is
/// the record inserted (and the parent's `updated_at` touched).
#[utoipa::path(
    post,
    path = "/events/{id}/records",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = AddRecordRequest,
    responses(
        (status = 201, description = "Record created", body = EventRecordDto),
        (status = 400, description = "Empty content"),
        (status = 404, description = "Unknown event"),
        (status = 409, description = "Event already closed"),
        (status = 502, description = "Summarization failed; nothing persisted")
    )
)]
pub async fn add_record_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<AddRecordRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "请输入进展内容".to_string()));
    }

    let event = load_owned_event(&state, user_id, event_id).await?;
    reject_closed(&event)?;

    let ai_summary = state
        .record_llm
        .summarize_record(&content)
        .await
        .map_err(|e| {
            error!("Failed to summarize record: {:?}", e);
            (
                StatusCode::BAD_GATEWAY,
                "无法整理进展内容，请稍后重试".to_string(),
            )
        })?;

    let record = state
        .store
        .create_record(NewEventRecord {
            event_id,
            original_content: content,
            ai_summary,
        })
        .await
        .map_err(|e| internal_error("Failed to create record", e))?;

    Ok((StatusCode::CREATED, Json(EventRecordDto::from(record))))
}

/// Replace a record's AI summary with hand-edited text.
#[utoipa::path(
    put,
    path = "/records/{id}",
    params(("id" = Uuid, Path, description = "Record id")),
    request_body = UpdateRecordRequest,
    responses(
        (status = 204, description = "Record updated"),
        (status = 404, description = "Unknown record"),
        (status = 409, description = "Event already closed")
    )
)]
pub async fn update_record_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(record_id): Path<Uuid>,
    Json(req): Json<UpdateRecordRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let summary = req.ai_summary.trim().to_string();
    if summary.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "进展内容不能为空".to_string()));
    }

    let (record_id, event) = load_record_event(&state, user_id, record_id).await?;
    reject_closed(&event)?;

    state
        .store
        .update_record_summary(record_id, &summary)
        .await
        .map_err(|e| internal_error("Failed to update record", e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a single progress record.
#[utoipa::path(
    delete,
    path = "/records/{id}",
    params(("id" = Uuid, Path, description = "Record id")),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Unknown record"),
        (status = 409, description = "Event already closed")
    )
)]
pub async fn delete_record_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(record_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let (record_id, event) = load_record_event(&state, user_id, record_id).await?;
    reject_closed(&event)?;

    state
        .store
        .delete_record(record_id)
        .await
        .map_err(|e| internal_error("Failed to delete record", e))?;

    Ok(StatusCode::NO_CONTENT)
}
