//! Login issuing a session token as body and cookie.

use anyhow::Context;
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap},
    response::IntoResponse,
    Json,
};
use bcrypt::verify;
use sqlx::PgPool;
use std::sync::Arc;

use crate::account::store;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::token::issue_session_token;

use super::session::session_cookie;
use super::types::{LoginRequest, LoginResponse, MessageResponse};
use super::utils::normalize_email;

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token in body and cookie", body = LoginResponse),
        (status = 400, description = "Missing fields", body = MessageResponse),
        (status = 401, description = "Wrong password", body = MessageResponse),
        (status = 403, description = "Email not verified", body = MessageResponse),
        (status = 404, description = "No such account", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<LoginRequest>>,
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

    let account = store::find_account_by_email(&pool, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("No account found. Please sign up first.".to_string()))?;

    let password_ok = verify(&request.password, &account.password_hash)
        .context("failed to verify password hash")?;
    if !password_ok {
        return Err(ApiError::InvalidCredentials);
    }

    if !account.is_verified {
        return Err(ApiError::Forbidden(
            "Please verify your email to continue".to_string(),
        ));
    }

    let token = issue_session_token(state.config().token_secret(), account.id, &account.email)?;

    let mut headers = HeaderMap::new();
    if let Ok(cookie) = session_cookie(state.config(), &token) {
        headers.insert(SET_COOKIE, cookie);
    }

    Ok((headers, Json(LoginResponse { token })))
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
    async fn login_missing_payload() -> Result<()> {
        let response = login(Extension(lazy_pool()?), Extension(state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn login_empty_fields() -> Result<()> {
        let response = login(
            Extension(lazy_pool()?),
            Extension(state()),
            Some(Json(LoginRequest {
                email: String::new(),
                password: "password1".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
