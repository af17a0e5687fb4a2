//! services/api/src/web/admin.rs
//!
//! Admin-only endpoints: user listing, role changes, and user deletion.
//! These routes sit behind `require_admin`, which re-reads the caller's
//! role from the database on every request.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use event_journal_core::domain::{Profile, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct ProfileDto {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for ProfileDto {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            role: profile.role.as_str().to_string(),
            created_at: profile.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: String,
}

fn internal_error(context: &str, e: impl std::fmt::Debug) -> (StatusCode, String) {
    error!("{}: {:?}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "操作失败，请稍后重试".to_string(),
    )
}

/// List all user profiles, newest first.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All profiles", body = [ProfileDto]),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProfileDto>>, (StatusCode, String)> {
    let profiles = state
        .store
        .list_profiles()
        .await
        .map_err(|e| internal_error("Failed to list profiles", e))?;
    Ok(Json(profiles.into_iter().map(Into::into).collect()))
}

/// Change a user's role.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 204, description = "Role updated"),
        (status = 400, description = "Unknown role value"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn update_role_handler(
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let role = Role::parse(&req.role)
        .ok_or((StatusCode::BAD_REQUEST, "无效的角色".to_string()))?;

    state
        .store
        .profile_by_id(target_id)
        .await
        .map_err(|e| internal_error("Failed to load profile", e))?
        .ok_or((StatusCode::NOT_FOUND, "用户不存在".to_string()))?;

    state
        .store
        .update_role(target_id, role)
        .await
        .map_err(|e| internal_error("Failed to update role", e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a user and everything they own.
///
/// Cascade order: events (records follow via the database cascade), then
/// the profile row, then the auth identity. The last step is best-effort:
/// its failure is logged but the earlier deletions are not rolled back.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User and their data deleted"),
        (status = 400, description = "Attempted self-deletion"),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller_id): Extension<Uuid>,
    Path(target_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if target_id == caller_id {
        return Err((StatusCode::BAD_REQUEST, "不能删除自己的账户".to_string()));
    }

    state
        .store
        .profile_by_id(target_id)
        .await
        .map_err(|e| internal_error("Failed to load profile", e))?
        .ok_or((StatusCode::NOT_FOUND, "用户不存在".to_string()))?;

    state
        .store
        .delete_user_events(target_id)
        .await
        .map_err(|e| internal_error("Failed to delete user events", e))?;

    state
        .store
        .delete_profile(target_id)
        .await
        .map_err(|e| internal_error("Failed to delete profile", e))?;

    if let Err(e) = state.store.delete_auth_user(target_id).await {
        // Accepted non-atomic cascade: events and profile are already gone.
        error!("Failed to delete auth identity for {}: {:?}", target_id, e);
    }

    Ok(StatusCode::NO_CONTENT)
}
