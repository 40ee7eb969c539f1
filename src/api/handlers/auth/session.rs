//! Session cookie handling and the authenticated-principal extractor.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::state::{AppConfig, AppState};
use crate::token::{decode_session_token, SESSION_TOKEN_TTL_SECONDS};

use super::types::MessageResponse;

const SESSION_COOKIE_NAME: &str = "dtg_session";

/// The authenticated account behind a bearer token or session cookie.
#[derive(Debug, Clone)]
pub struct Principal {
    pub account_id: i64,
    pub email: String,
}

/// Resolve the request's session token into a principal.
///
/// # Errors
/// Returns `ApiError::InvalidCredentials` (401) when the token is missing,
/// malformed, expired, or carries a non-numeric subject.
pub fn require_auth(headers: &HeaderMap, config: &AppConfig) -> Result<Principal, ApiError> {
    let token = extract_session_token(headers).ok_or(ApiError::InvalidCredentials)?;
    let claims = decode_session_token(config.token_secret(), &token)
        .map_err(|_| ApiError::InvalidCredentials)?;
    let account_id = claims
        .sub
        .parse()
        .map_err(|_| ApiError::InvalidCredentials)?;
    Ok(Principal {
        account_id,
        email: claims.email,
    })
}

#[utoipa::path(
    post,
    path = "/session/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout(state: Extension<Arc<AppState>>) -> impl IntoResponse {
    // Always clear the cookie; there is no server-side session to delete.
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(state.config()) {
        headers.insert(SET_COOKIE, cookie);
    }
    (
        StatusCode::OK,
        headers,
        Json(MessageResponse::new("Logged out")),
    )
}

/// Build a secure `HttpOnly` cookie for the session token.
pub(crate) fn session_cookie(
    config: &AppConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; \
         Max-Age={SESSION_TOKEN_TTL_SECONDS}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AppConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::issue_session_token;
    use anyhow::Result;
    use secrecy::SecretString;

    fn config() -> AppConfig {
        AppConfig::new(SecretString::from("test-secret"))
    }

    fn https_config() -> AppConfig {
        config().with_frontend_base_url("https://portal.example.com".to_string())
    }

    #[test]
    fn bearer_token_authenticates() -> Result<()> {
        let config = config();
        let token = issue_session_token(config.token_secret(), 7, "a@x.com")?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse()?);

        let principal = require_auth(&headers, &config)
            .map_err(|err| anyhow::anyhow!("auth failed: {err}"))?;
        assert_eq!(principal.account_id, 7);
        assert_eq!(principal.email, "a@x.com");
        Ok(())
    }

    #[test]
    fn cookie_token_authenticates() -> Result<()> {
        let config = config();
        let token = issue_session_token(config.token_secret(), 7, "a@x.com")?;
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, format!("other=1; dtg_session={token}").parse()?);

        let principal = require_auth(&headers, &config)
            .map_err(|err| anyhow::anyhow!("auth failed: {err}"))?;
        assert_eq!(principal.account_id, 7);
        Ok(())
    }

    #[test]
    fn missing_token_is_unauthorized() {
        let result = require_auth(&HeaderMap::new(), &config());
        assert!(matches!(result, Err(ApiError::InvalidCredentials)));
    }

    #[test]
    fn garbage_token_is_unauthorized() -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer not-a-token".parse()?);
        let result = require_auth(&headers, &config());
        assert!(matches!(result, Err(ApiError::InvalidCredentials)));
        Ok(())
    }

    #[test]
    fn session_cookie_shape() -> Result<()> {
        let cookie = session_cookie(&config(), "tok")?;
        let value = cookie.to_str()?;
        assert!(value.starts_with("dtg_session=tok;"));
        assert!(value.contains("HttpOnly"));
        assert!(!value.contains("Secure"));

        let secure = session_cookie(&https_config(), "tok")?;
        assert!(secure.to_str()?.contains("Secure"));
        Ok(())
    }

    #[test]
    fn clear_cookie_expires_immediately() -> Result<()> {
        let cookie = clear_session_cookie(&config())?;
        assert!(cookie.to_str()?.contains("Max-Age=0"));
        Ok(())
    }
}
