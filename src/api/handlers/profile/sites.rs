//! Listing the caller's site rows.

use axum::{extract::Extension, http::HeaderMap, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::account::models::Site;
use crate::account::store;
use crate::api::error::ApiError;
use crate::api::state::AppState;

use super::super::auth::session::require_auth;
use super::super::auth::types::MessageResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct SiteResponse {
    pub id: i64,
    pub user_id: i64,
    pub site_slug: String,
    pub label: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Site> for SiteResponse {
    fn from(site: Site) -> Self {
        Self {
            id: site.id,
            user_id: site.user_id,
            site_slug: site.site_slug,
            label: site.label,
            is_default: site.is_default,
            created_at: site.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/profile/sites",
    responses(
        (status = 200, description = "Sites, default first then by creation time", body = [SiteResponse]),
        (status = 401, description = "No valid session", body = MessageResponse)
    ),
    tag = "profile"
)]
pub async fn list_sites(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, state.config())?;

    let sites = store::list_sites(&pool, principal.account_id)
        .await?
        .into_iter()
        .map(SiteResponse::from)
        .collect::<Vec<_>>();

    Ok(Json(sites))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogMailer;
    use crate::api::state::AppConfig;
    use anyhow::Result;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn list_sites_requires_session() -> Result<()> {
        let state = Arc::new(AppState::new(
            AppConfig::new(SecretString::from("test-secret")),
            Arc::new(LogMailer),
        ));
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;

        let response = list_sites(Extension(pool), Extension(state), HeaderMap::new())
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }
}
