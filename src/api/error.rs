//! Error taxonomy for the HTTP boundary.
//!
//! Handlers return `Result<_, ApiError>` so the status mapping is the
//! visible contract. Database and other unexpected failures collapse into
//! `Database`, which logs the source and answers with a generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::token::TokenError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid or expired verification link")]
    InvalidToken,
    #[error("Invalid code or email")]
    InvalidReset,
    #[error("The provided credentials are invalid.")]
    InvalidCredentials,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Internal server error")]
    Database(#[from] anyhow::Error),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidToken | Self::InvalidReset => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.into())
    }
}

impl From<TokenError> for ApiError {
    fn from(_: TokenError) -> Self {
        Self::InvalidToken
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Database(err) = &self {
            // The generic body hides the cause; the log keeps it.
            error!("request failed: {err:?}");
        }
        let status = self.status();
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
