//! services/api/src/web/events.rs
//!
//! Axum handlers for the event CRUD surface: listing with filters, detail
//! with records, creation, editing, deletion, the one-way closure flow, and
//! the plain-text export.

use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use event_journal_core::domain::{
    Event, EventPatch, EventRecord, EventStats, EventStatus, EventWithRecords, NewEvent,
};
use event_journal_core::export::event_export_text;
use event_journal_core::period::{rolling_window, DateFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct EventDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub status: String,
    pub importance: i32,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Event> for EventDto {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            title: event.title,
            description: event.description,
            category: event.category,
            status: event.status.as_str().to_string(),
            importance: event.importance,
            summary: event.summary,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct EventRecordDto {
    pub id: Uuid,
    pub event_id: Uuid,
    pub original_content: String,
    pub ai_summary: String,
    pub created_at: DateTime<Utc>,
}

impl From<EventRecord> for EventRecordDto {
    fn from(record: EventRecord) -> Self {
        Self {
            id: record.id,
            event_id: record.event_id,
            original_content: record.original_content,
            ai_summary: record.ai_summary,
            created_at: record.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct EventDetailDto {
    #[serde(flatten)]
    pub event: EventDto,
    pub records: Vec<EventRecordDto>,
    pub record_count: usize,
}

impl From<EventWithRecords> for EventDetailDto {
    fn from(detail: EventWithRecords) -> Self {
        Self {
            event: detail.event.into(),
            record_count: detail.record_count,
            records: detail.records.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StatsDto {
    pub total: usize,
    pub ongoing: usize,
    pub closed: usize,
}

impl From<EventStats> for StatsDto {
    fn from(stats: EventStats) -> Self {
        Self {
            total: stats.total,
            ongoing: stats.ongoing,
            closed: stats.closed,
        }
    }
}

/// Filters for the event list. At most one of `category`, `status` and
/// `range` is applied, in that order of precedence.
#[derive(Deserialize)]
pub struct ListEventsQuery {
    pub category: Option<String>,
    pub status: Option<String>,
    pub range: Option<DateFilter>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub importance: Option<i32>,
}

/// Editable event fields. Status and summary are deliberately absent:
/// closure is the only way to set them.
#[derive(Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub importance: Option<i32>,
}

//=========================================================================================
// Shared Helpers
//=========================================================================================

fn internal_error(context: &str, e: impl std::fmt::Debug) -> (StatusCode, String) {
    error!("{}: {:?}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "操作失败，请稍后重试".to_string(),
    )
}

const NOT_FOUND: (StatusCode, &str) = (StatusCode::NOT_FOUND, "事件不存在");

/// Loads an event and checks ownership. Non-owners get the same 404 as a
/// missing event, so existence is not leaked.
pub(crate) async fn load_owned_event(
    state: &AppState,
    user_id: Uuid,
    event_id: Uuid,
) -> Result<Event, (StatusCode, String)> {
    let event = state
        .store
        .event_by_id(event_id)
        .await
        .map_err(|e| internal_error("Failed to load event", e))?
        .ok_or((NOT_FOUND.0, NOT_FOUND.1.to_string()))?;

    if event.user_id != user_id {
        return Err((NOT_FOUND.0, NOT_FOUND.1.to_string()));
    }
    Ok(event)
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the caller's events, optionally filtered.
#[utoipa::path(
    get,
    path = "/events",
    params(
        ("category" = Option<String>, Query, description = "Only events with this category"),
        ("status" = Option<String>, Query, description = "ongoing or closed"),
        ("range" = Option<String>, Query, description = "today, week, month, year or all")
    ),
    responses(
        (status = 200, description = "Events sorted by updated_at descending", body = [EventDto]),
        (status = 400, description = "Invalid filter value")
    )
)]
pub async fn list_events_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Vec<EventDto>>, (StatusCode, String)> {
    let events = if let Some(category) = query.category {
        state.store.events_by_category(user_id, &category).await
    } else if let Some(status) = query.status {
        let status = EventStatus::parse(&status)
            .ok_or((StatusCode::BAD_REQUEST, "无效的状态筛选".to_string()))?;
        state.store.events_by_status(user_id, status).await
    } else if let Some(filter) = query.range {
        match rolling_window(filter, Utc::now()) {
            Some((start, end)) => state.store.events_by_date_range(user_id, start, end).await,
            None => state.store.events_for_user(user_id).await,
        }
    } else {
        state.store.events_for_user(user_id).await
    }
    .map_err(|e| internal_error("Failed to list events", e))?;

    Ok(Json(events.into_iter().map(Into::into).collect()))
}

/// Create a new event.
#[utoipa::path(
    post,
    path = "/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventDto),
        (status = 400, description = "Missing title")
    )
)]
pub async fn create_event_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "请输入事件标题".to_string()));
    }
    if let Some(importance) = req.importance {
        if !(1..=5).contains(&importance) {
            return Err((StatusCode::BAD_REQUEST, "重要程度必须在1到5之间".to_string()));
        }
    }

    let event = state
        .store
        .create_event(
            user_id,
            NewEvent {
                title,
                description: req.description.filter(|d| !d.trim().is_empty()),
                category: req.category,
                importance: req.importance,
            },
        )
        .await
        .map_err(|e| internal_error("Failed to create event", e))?;

    Ok((StatusCode::CREATED, Json(EventDto::from(event))))
}

/// Fetch one event with its full ordered record list.
#[utoipa::path(
    get,
    path = "/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event with records", body = EventDetailDto),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn get_event_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventDetailDto>, (StatusCode, String)> {
    load_owned_event(&state, user_id, event_id).await?;

    let detail = state
        .store
        .event_with_records(event_id)
        .await
        .map_err(|e| internal_error("Failed to load event records", e))?
        .ok_or((NOT_FOUND.0, NOT_FOUND.1.to_string()))?;

    Ok(Json(detail.into()))
}

/// Edit an event's metadata. Closed events are immutable.
#[utoipa::path(
    put,
    path = "/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = EventDto),
        (status = 404, description = "Unknown event"),
        (status = 409, description = "Event already closed")
    )
)]
pub async fn update_event_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<EventDto>, (StatusCode, String)> {
    let event = load_owned_event(&state, user_id, event_id).await?;
    if event.status == EventStatus::Closed {
        return Err((StatusCode::CONFLICT, "已闭环的事件不能再编辑".to_string()));
    }
    if let Some(importance) = req.importance {
        if !(1..=5).contains(&importance) {
            return Err((StatusCode::BAD_REQUEST, "重要程度必须在1到5之间".to_string()));
        }
    }

    let updated = state
        .store
        .update_event(
            event_id,
            EventPatch {
                title: req.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
                description: req.description,
                category: req.category.filter(|c| !c.trim().is_empty()),
                importance: req.importance,
                status: None,
                summary: None,
            },
        )
        .await
        .map_err(|e| internal_error("Failed to update event", e))?;

    Ok(Json(updated.into()))
}

/// Delete an event; its records are removed by the database cascade.
#[utoipa::path(
    delete,
    path = "/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn delete_event_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(event_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    load_owned_event(&state, user_id, event_id).await?;

    state
        .store
        .delete_event(event_id)
        .await
        .map_err(|e| internal_error("Failed to delete event", e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Close an event: generate the AI retrospective, then persist status and
/// summary in one write.
///
/// The ordering matters: the status transition is committed only after the
/// AI call has fully succeeded. On AI failure the event stays ongoing and
/// nothing is persisted.
#[utoipa::path(
    post,
    path = "/events/{id}/close",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Closed event with its summary", body = EventDto),
        (status = 404, description = "Unknown event"),
        (status = 409, description = "Event already closed"),
        (status = 502, description = "Summary generation failed; event unchanged")
    )
)]
pub async fn close_event_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventDto>, (StatusCode, String)> {
    let event = load_owned_event(&state, user_id, event_id).await?;
    if event.status == EventStatus::Closed {
        return Err((StatusCode::CONFLICT, "事件已经闭环".to_string()));
    }

    let records = state
        .store
        .records_for_event(event_id)
        .await
        .map_err(|e| internal_error("Failed to load event records", e))?;

    let summary = state
        .closure_llm
        .summarize_event(&event.title, &records)
        .await
        .map_err(|e| {
            error!("Failed to generate closure summary: {:?}", e);
            (
                StatusCode::BAD_GATEWAY,
                "无法生成事件总结，请稍后重试".to_string(),
            )
        })?;

    let closed = state
        .store
        .update_event(
            event_id,
            EventPatch {
                status: Some(EventStatus::Closed),
                summary: Some(summary),
                ..EventPatch::default()
            },
        )
        .await
        .map_err(|e| internal_error("Failed to close event", e))?;

    Ok(Json(closed.into()))
}

/// Download one event as a plain-text document.
#[utoipa::path(
    get,
    path = "/events/{id}/export",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Plain-text export", content_type = "text/plain"),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn export_event_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    load_owned_event(&state, user_id, event_id).await?;

    let detail = state
        .store
        .event_with_records(event_id)
        .await
        .map_err(|e| internal_error("Failed to load event records", e))?
        .ok_or((NOT_FOUND.0, NOT_FOUND.1.to_string()))?;

    let body = event_export_text(&detail);
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    ))
}

/// The caller's event counts.
#[utoipa::path(
    get,
    path = "/events/stats",
    responses((status = 200, description = "Event counts", body = StatsDto))
)]
pub async fn event_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<StatsDto>, (StatusCode, String)> {
    let stats = state
        .store
        .event_stats(user_id)
        .await
        .map_err(|e| internal_error("Failed to load stats", e))?;
    Ok(Json(stats.into()))
}

/// The caller's distinct event categories.
#[utoipa::path(
    get,
    path = "/events/categories",
    responses((status = 200, description = "Distinct non-empty categories", body = [String]))
)]
pub async fn categories_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    let categories = state
        .store
        .all_categories(user_id)
        .await
        .map_err(|e| internal_error("Failed to load categories", e))?;
    Ok(Json(categories))
}
