//! Password reset via emailed six-digit codes.

use anyhow::Context;
use axum::{extract::Extension, response::IntoResponse, Json};
use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;

use crate::account::store;
use crate::api::email::{reset_code_email, send_in_background};
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::reset_code;

use super::types::{ForgotPasswordRequest, MessageResponse, ResetPasswordRequest};
use super::utils::{normalize_email, valid_password};

/// Identical response whether or not the email is registered.
const FORGOT_MESSAGE: &str = "If the email exists, a reset code was sent";

#[utoipa::path(
    post,
    path = "/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Generic acknowledgement, sent or not", body = MessageResponse),
        (status = 400, description = "Missing payload", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let email = normalize_email(&request.email);
    if email.is_empty() {
        return Ok(Json(MessageResponse::new(FORGOT_MESSAGE)));
    }

    if let Some(account) = store::find_account_by_email(&pool, &email).await? {
        // A fresh request overwrites any previous code and restarts the
        // 30-minute expiry.
        let code = reset_code::generate();
        store::set_reset_code(&pool, account.id, &code).await?;
        send_in_background(state.mailer(), reset_code_email(&email, &code));
    }

    Ok(Json(MessageResponse::new(FORGOT_MESSAGE)))
}

#[utoipa::path(
    post,
    path = "/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced, code consumed", body = MessageResponse),
        (status = 400, description = "Invalid fields, code, or expiry", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    pool: Extension<PgPool>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let email = normalize_email(&request.email);
    let code = request.code.trim();
    if email.is_empty() || code.is_empty() || request.new_password.is_empty() {
        return Err(ApiError::Validation(
            "Email, code and new password are required".to_string(),
        ));
    }
    if !valid_password(&request.new_password) {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if !reset_code::is_well_formed(code) {
        return Err(ApiError::Validation(
            "Code must be a 6-digit number".to_string(),
        ));
    }

    // Every failure past this point answers alike so a caller cannot
    // distinguish an unknown email from a wrong or expired code.
    let Some(account) = store::find_account_by_email(&pool, &email).await? else {
        return Err(ApiError::InvalidReset);
    };

    let (Some(stored), Some(expires_at)) = (
        account.password_reset_code.as_deref(),
        account.password_reset_expires_at,
    ) else {
        return Err(ApiError::InvalidReset);
    };

    if expires_at < Utc::now() {
        // Stale codes are dropped as soon as they are seen.
        store::clear_reset_code(&pool, account.id).await?;
        return Err(ApiError::InvalidReset);
    }

    if stored != code {
        return Err(ApiError::InvalidReset);
    }

    let password_hash =
        hash(&request.new_password, DEFAULT_COST).context("failed to hash password")?;
    store::apply_password_reset(&pool, account.id, &password_hash).await?;

    Ok(Json(MessageResponse::new(
        "Password updated. Please log in.",
    )))
}
