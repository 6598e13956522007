//! Password authentication handlers (signup, login, logout, me, csrf)

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};

use hearth_auth_core::NewAccount;
use hearth_db::UserRow;

use crate::cookies::{cookie_value, login_cookies, logout_cookies, SESSION_COOKIE};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::middleware::ANONYMOUS_BUCKET;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub avatar_url: String,
    pub admin: bool,
    pub household_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserRow> for UserInfo {
    fn from(user: UserRow) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            admin: user.admin,
            household_id: user.household_id,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /signup
///
/// Create a household and its founding user atomically
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .accounts
        .sign_up(NewAccount {
            email: req.email,
            password: req.password,
            name: req.name,
            avatar_url: req.avatar_url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserInfo::from(user))))
}

/// POST /login
///
/// Exchange email/password for a session cookie
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let session_token = state.accounts.login(&req.email, &req.password).await?;

    let [token_cookie, flag_cookie] = login_cookies(&state.config, &session_token);
    Ok((
        AppendHeaders([(SET_COOKIE, token_cookie), (SET_COOKIE, flag_cookie)]),
        Json(StatusResponse {
            status: "logged_in",
        }),
    ))
}

/// POST /logout
///
/// Clear the session cookies
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let [token_cookie, flag_cookie] = logout_cookies(&state.config);
    (
        AppendHeaders([(SET_COOKIE, token_cookie), (SET_COOKIE, flag_cookie)]),
        Json(StatusResponse {
            status: "logged_out",
        }),
    )
}

/// GET /user
///
/// Get the logged-in user
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<UserInfo>> {
    let user = state.accounts.current_user(auth.user_id).await?;
    Ok(Json(UserInfo::from(user)))
}

/// DELETE /user
///
/// Delete the logged-in user's account and clear the session cookies
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<impl IntoResponse> {
    state.accounts.delete_account(auth.user_id).await?;

    let [token_cookie, flag_cookie] = logout_cookies(&state.config);
    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(SET_COOKIE, token_cookie), (SET_COOKIE, flag_cookie)]),
    ))
}

/// GET /csrf
///
/// Issue (or return the still-valid) CSRF token for this client.
///
/// Clients without a session cookie all share the anonymous bucket; see
/// [`crate::middleware::ANONYMOUS_BUCKET`].
pub async fn csrf_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<CsrfTokenResponse> {
    let session_id = cookie_value(&headers, SESSION_COOKIE)
        .unwrap_or_else(|| ANONYMOUS_BUCKET.to_string());

    Json(CsrfTokenResponse {
        csrf_token: state.csrf.issue(&session_id),
    })
}
