//! Household membership handlers

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::handlers::UserInfo;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JoinHouseholdRequest {
    pub invite_code: String,
}

#[derive(Debug, Serialize)]
pub struct JoinHouseholdResponse {
    pub message: &'static str,
}

/// GET /household/users
///
/// List the members of the logged-in user's household
pub async fn household_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<UserInfo>>> {
    let users = state.accounts.household_users(auth.user_id).await?;
    Ok(Json(users.into_iter().map(UserInfo::from).collect()))
}

/// POST /household/join
///
/// Move the logged-in user into the household matching the invite code
pub async fn join_household(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<JoinHouseholdRequest>,
) -> ApiResult<Json<JoinHouseholdResponse>> {
    state
        .accounts
        .join_household(auth.user_id, &req.invite_code)
        .await?;

    Ok(Json(JoinHouseholdResponse {
        message: "Joined household",
    }))
}
