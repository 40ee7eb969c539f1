//! The authenticated-account summary endpoint.

use axum::{extract::Extension, http::HeaderMap, response::IntoResponse, Json};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::account::store;
use crate::api::error::ApiError;
use crate::api::state::AppState;

use super::auth::session::require_auth;
use super::auth::types::MessageResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub is_verified: bool,
}

#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The caller's account", body = MeResponse),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 404, description = "Account no longer exists", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn me(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, state.config())?;

    // The token can outlive the account row.
    let account = store::find_account_by_id(&pool, principal.account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(MeResponse {
        id: account.id,
        email: account.email,
        is_verified: account.is_verified,
    }))
}
