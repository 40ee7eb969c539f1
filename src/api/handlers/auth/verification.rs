//! Email verification endpoints.

use axum::{extract::Extension, response::IntoResponse, Json};
use sqlx::PgPool;
use std::sync::Arc;

use crate::account::store;
use crate::api::email::{send_in_background, verification_email};
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::token::{decode_verify_token, issue_verify_token};

use super::types::{
    MessageResponse, ResendVerificationRequest, VerifyEmailRequest, VerifyEmailResponse,
};
use super::utils::{build_setup_link, normalize_email, valid_email};

/// Identical response whether or not the email is registered.
const RESEND_MESSAGE: &str = "If the email exists, a new link was sent";

#[utoipa::path(
    post,
    path = "/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified (idempotent)", body = VerifyEmailResponse),
        (status = 400, description = "Invalid or expired token", body = MessageResponse),
        (status = 404, description = "Account no longer exists", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn verify_email(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<VerifyEmailRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let token = request.token.trim();
    let account_id = decode_verify_token(state.config().token_secret(), token)?;

    let account = store::find_account_by_id(&pool, account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // First verification stamps the timestamp; re-verifying is a no-op
    // success, the guarded UPDATE matches zero rows.
    if !account.is_verified {
        store::mark_email_verified(&pool, account_id).await?;
    }

    Ok(Json(VerifyEmailResponse {
        message: "Email verified".to_string(),
        email: account.email,
        setup_token: token.to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/resend-verification",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Generic acknowledgement, sent or not", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ResendVerificationRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        // Same acknowledgement for malformed input to avoid account probing.
        return Ok(Json(MessageResponse::new(RESEND_MESSAGE)));
    }

    if let Some(account) = store::find_account_by_email(&pool, &email).await? {
        if !account.is_verified {
            let token = issue_verify_token(state.config().token_secret(), account.id)?;
            let link = build_setup_link(state.config().frontend_base_url(), &token);
            send_in_background(state.mailer(), verification_email(&email, &link));
        }
    }

    Ok(Json(MessageResponse::new(RESEND_MESSAGE)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogMailer;
    use crate::api::state::AppConfig;
    use anyhow::Result;
    use axum::http::StatusCode;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(
            AppConfig::new(SecretString::from("test-secret")),
            Arc::new(LogMailer),
        ))
    }

    fn lazy_pool() -> Result<PgPool> {
        Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
    }

    #[tokio::test]
    async fn verify_email_missing_payload() -> Result<()> {
        let response = verify_email(Extension(lazy_pool()?), Extension(state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn verify_email_rejects_garbage_token() -> Result<()> {
        let response = verify_email(
            Extension(lazy_pool()?),
            Extension(state()),
            Some(Json(VerifyEmailRequest {
                token: "not-a-token".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn resend_verification_missing_payload() -> Result<()> {
        let response = resend_verification(Extension(lazy_pool()?), Extension(state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn resend_verification_malformed_email_is_generic_ok() -> Result<()> {
        let response = resend_verification(
            Extension(lazy_pool()?),
            Extension(state()),
            Some(Json(ResendVerificationRequest {
                email: "not-an-email".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }
}
