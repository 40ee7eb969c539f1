//! The read-only profile-setup gate consulted before the setup form submits.

use axum::{extract::Extension, Json};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::account::store;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::token::decode_verify_token;

use super::types::{CheckMemberRequest, CheckMemberResponse, MessageResponse};
use super::utils::normalize_email;

const SETUP_WINDOW_DAYS: i64 = 30;

/// Whether the 30-day setup window is still open, measured from the given
/// reference timestamp. No reference means the account predates the
/// timestamps and is allowed through.
#[must_use]
pub fn setup_window_open(reference: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    reference.is_none_or(|ts| now.signed_duration_since(ts) <= Duration::days(SETUP_WINDOW_DAYS))
}

fn denied(exists: bool, message: &str) -> CheckMemberResponse {
    CheckMemberResponse {
        exists,
        allowed: false,
        message: message.to_string(),
    }
}

#[utoipa::path(
    post,
    path = "/check-member",
    request_body = CheckMemberRequest,
    responses(
        (status = 200, description = "Eligibility verdict; never mutates state", body = CheckMemberResponse),
        (status = 400, description = "Missing email", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn check_member(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<CheckMemberRequest>>,
) -> Result<Json<CheckMemberResponse>, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let email = normalize_email(&request.email);
    if email.is_empty() {
        return Err(ApiError::Validation("Email is required".to_string()));
    }

    let Some(account) = store::find_account_by_email(&pool, &email).await? else {
        return Ok(Json(denied(
            false,
            "This email isn't registered. Please sign up first.",
        )));
    };

    // A supplied token must decode and bind to this same account. Both
    // failure shapes answer alike so the caller cannot tell them apart.
    if let Some(token) = request.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        match decode_verify_token(state.config().token_secret(), token) {
            Ok(id) if id == account.id => {}
            Ok(_) => {
                return Ok(Json(denied(
                    true,
                    "The verification link does not match this email.",
                )));
            }
            Err(_) => {
                return Ok(Json(denied(true, "Invalid or expired verification token.")));
            }
        }
    }

    if account.profile_completed_at.is_some() {
        return Ok(Json(denied(true, "Profile already completed. Please log in.")));
    }

    let reference = account.email_verified_at.or(Some(account.created_at));
    if setup_window_open(reference, Utc::now()) {
        return Ok(Json(CheckMemberResponse {
            exists: true,
            allowed: true,
            message: "OK".to_string(),
        }));
    }

    Ok(Json(denied(
        true,
        "This verification link has expired (over 30 days). Please request a new verification email.",
    )))
}
