//! LINE federated login handlers
//!
//! `GET /auth/line/login` starts the flow; the provider redirects back to
//! `GET /auth/line/callback`, which either logs the user in (known identity)
//! or parks the verified identity in a pre-auth cookie for the link/create
//! step.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};

use hearth_auth_core::FederatedLogin;

use crate::cookies::{
    clear_pre_auth_cookie, cookie_value, login_cookies, pre_auth_cookie, PRE_AUTH_COOKIE,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LineLoginResponse {
    pub auth_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LinkAccountRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /auth/line/login
///
/// Start the LINE authorization-code flow
pub async fn line_login(State(state): State<AppState>) -> ApiResult<Json<LineLoginResponse>> {
    let start = state.line_login.begin_login()?;
    Ok(Json(LineLoginResponse {
        auth_url: start.auth_url,
    }))
}

/// GET /auth/line/callback
///
/// Complete the flow: a known identity gets session cookies, an unknown one
/// gets a pre-auth cookie for `/auth/line/link` or `/auth/line/create`.
pub async fn line_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.line_login.callback(&params.code, &params.state).await?;

    match outcome {
        FederatedLogin::ExistingUser { session_token } => {
            let [token_cookie, flag_cookie] = login_cookies(&state.config, &session_token);
            Ok((
                AppendHeaders(vec![(SET_COOKIE, token_cookie), (SET_COOKIE, flag_cookie)]),
                Json(CallbackResponse {
                    status: "logged_in",
                    line_name: None,
                    line_picture: None,
                }),
            ))
        }
        FederatedLogin::Unregistered {
            line_user_id,
            display_name,
            avatar_url,
        } => {
            let token = state
                .line_login
                .issue_pre_auth(&line_user_id, &display_name, &avatar_url)?;

            Ok((
                AppendHeaders(vec![(SET_COOKIE, pre_auth_cookie(&state.config, &token))]),
                Json(CallbackResponse {
                    status: "unregistered",
                    line_name: Some(display_name),
                    line_picture: Some(avatar_url),
                }),
            ))
        }
    }
}

/// POST /auth/line/link
///
/// Attach the pending LINE identity to an existing password account
pub async fn line_link_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LinkAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    let pre_auth_token = pending_pre_auth(&headers)?;

    let session_token = state
        .line_login
        .link_account(&pre_auth_token, &req.email, &req.password)
        .await?;

    Ok((
        StatusCode::OK,
        logged_in_headers(&state, &session_token),
        Json(MessageResponse {
            message: "Account linked successfully",
        }),
    ))
}

/// POST /auth/line/create
///
/// Create a local account for the pending LINE identity
pub async fn line_create_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let pre_auth_token = pending_pre_auth(&headers)?;

    let session_token = state.line_login.create_account(&pre_auth_token).await?;

    Ok((
        StatusCode::CREATED,
        logged_in_headers(&state, &session_token),
        Json(MessageResponse {
            message: "Account created successfully",
        }),
    ))
}

/// Pull the pending pre-auth token out of its cookie
fn pending_pre_auth(headers: &HeaderMap) -> Result<String, ApiError> {
    cookie_value(headers, PRE_AUTH_COOKIE)
        .ok_or_else(|| ApiError::BadRequest("No pending LINE login found".to_string()))
}

/// Session cookies plus pre-auth cookie removal for a completed hand-off
fn logged_in_headers(
    state: &AppState,
    session_token: &str,
) -> AppendHeaders<Vec<(axum::http::HeaderName, String)>> {
    let [token_cookie, flag_cookie] = login_cookies(&state.config, session_token);
    AppendHeaders(vec![
        (SET_COOKIE, clear_pre_auth_cookie(&state.config)),
        (SET_COOKIE, token_cookie),
        (SET_COOKIE, flag_cookie),
    ])
}
