//! Account creation.

use anyhow::Context;
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use bcrypt::{hash, DEFAULT_COST};
use sqlx::PgPool;
use std::sync::Arc;

use crate::account::store::{self, SignupOutcome};
use crate::api::email::{send_in_background, verification_email};
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::token::issue_verify_token;

use super::types::{MessageResponse, SignupRequest};
use super::utils::{build_setup_link, normalize_email, valid_email, valid_password};

#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created, verification email dispatched", body = MessageResponse),
        (status = 400, description = "Missing or invalid fields", body = MessageResponse),
        (status = 409, description = "Email already registered", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn signup(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<SignupRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }
    if !valid_email(&email) {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }
    if !valid_password(&request.password) {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let password_hash = hash(&request.password, DEFAULT_COST).context("failed to hash password")?;

    // Account and empty profile land in one transaction; the unique index
    // resolves the duplicate-email race.
    let account_id = match store::create_account(&pool, &email, &password_hash).await? {
        SignupOutcome::Created(id) => id,
        SignupOutcome::Conflict => return Err(ApiError::DuplicateEmail),
    };

    let token = issue_verify_token(state.config().token_secret(), account_id)?;
    let link = build_setup_link(state.config().frontend_base_url(), &token);
    send_in_background(state.mailer(), verification_email(&email, &link));

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Verification email sent")),
    ))
}
