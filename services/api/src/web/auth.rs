//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and logout.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use event_journal_core::domain::AuthSession;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::OnceLock;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::session_id_from_cookies;
use crate::web::state::AppState;

const SESSION_DAYS: i64 = 30;
const MIN_PASSWORD_LEN: usize = 6;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
}

//=========================================================================================
// Validation
//=========================================================================================

/// Usernames are letters, digits and underscores only.
pub fn validate_username(username: &str) -> bool {
    static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
    let re = USERNAME_RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").unwrap());
    re.is_match(username)
}

fn check_credentials_format(username: &str, password: &str) -> Result<(), (StatusCode, String)> {
    if username.trim().is_empty() || password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "用户名和密码不能为空".to_string(),
        ));
    }
    if !validate_username(username) {
        return Err((
            StatusCode::BAD_REQUEST,
            "用户名只能包含字母、数字和下划线".to_string(),
        ));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err((StatusCode::BAD_REQUEST, "密码至少需要6个字符".to_string()));
    }
    Ok(())
}

fn session_cookie(session_id: &str, max_age_seconds: i64) -> String {
    format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        session_id, max_age_seconds
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid username or password format"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    check_credentials_format(&req.username, &req.password)?;

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "注册失败，请稍后重试".to_string(),
            )
        })?
        .to_string();

    // 2. Create user; the database trigger creates the profile and makes
    //    the first registrant an admin.
    let profile = state
        .store
        .create_user(&req.username, &password_hash)
        .await
        .map_err(|e| {
            error!("Failed to create user: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "注册失败，用户名可能已被占用".to_string(),
            )
        })?;

    // 3. Open a session for the new user
    let session = AuthSession::issue(profile.id, Utc::now(), SESSION_DAYS);
    state
        .store
        .create_auth_session(&session)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "注册失败，请稍后重试".to_string(),
            )
        })?;

    let cookie = session_cookie(&session.id, Duration::days(SESSION_DAYS).num_seconds());
    let response = AuthResponse {
        user_id: profile.id,
        username: profile.username,
        role: profile.role.as_str().to_string(),
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    check_credentials_format(&req.username, &req.password)?;

    // 1. Get user by username
    let creds = state
        .store
        .get_user_by_username(&req.username)
        .await
        .map_err(|e| {
            error!("Failed to get user: {:?}", e);
            (StatusCode::UNAUTHORIZED, "用户名或密码错误".to_string())
        })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "登录失败，请稍后重试".to_string(),
        )
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err((StatusCode::UNAUTHORIZED, "用户名或密码错误".to_string()));
    }

    // 3. Open a session
    let session = AuthSession::issue(creds.user_id, Utc::now(), SESSION_DAYS);
    state
        .store
        .create_auth_session(&session)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "登录失败，请稍后重试".to_string(),
            )
        })?;

    // 4. Load the profile for the response body
    let profile = state
        .store
        .profile_by_id(creds.user_id)
        .await
        .map_err(|e| {
            error!("Failed to load profile: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "登录失败，请稍后重试".to_string(),
            )
        })?
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, "用户名或密码错误".to_string()))?;

    let cookie = session_cookie(&session.id, Duration::days(SESSION_DAYS).num_seconds());
    let response = AuthResponse {
        user_id: profile.id,
        username: profile.username,
        role: profile.role.as_str().to_string(),
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Extract session cookie
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or((StatusCode::UNAUTHORIZED, "未登录".to_string()))?;

    // 2. Parse session ID from cookie
    let auth_session_id = session_id_from_cookies(cookie_header)
        .ok_or((StatusCode::UNAUTHORIZED, "未登录".to_string()))?;

    // 3. Delete auth session from database
    state
        .store
        .delete_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "退出失败，请稍后重试".to_string(),
            )
        })?;

    // 4. Clear cookie
    let cookie = session_cookie("", 0);
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_accepts_word_characters_only() {
        assert!(validate_username("a_b9"));
        assert!(validate_username("User_123"));
        assert!(!validate_username("a b"));
        assert!(!validate_username("名字"));
        assert!(!validate_username("a-b"));
        assert!(!validate_username(""));
    }

    #[test]
    fn short_passwords_are_rejected() {
        let err = check_credentials_format("alice", "12345").unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(check_credentials_format("alice", "123456").is_ok());
    }

    #[test]
    fn empty_fields_are_rejected() {
        assert!(check_credentials_format("", "secret1").is_err());
        assert!(check_credentials_format("alice", "").is_err());
    }

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie("abc", 60);
        assert!(cookie.starts_with("session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=60"));
    }
}
