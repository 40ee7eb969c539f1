//! Profile setup and management.

pub mod fields;
pub mod sites;

use axum::{extract::Extension, http::HeaderMap, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::account::models::Profile;
use crate::account::store::{self, SiteSpec};
use crate::api::dashboard::{log_best_effort, notify_default_site};
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::token::decode_verify_token;

use self::fields::{canonical_site_label, clean_text, parse_list_field, site_slug, FieldError};

use super::auth::session::require_auth;
use super::auth::types::MessageResponse;

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

/// Profile payload shared by the setup and read endpoints. `id` is the
/// account id, not the profile row id.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub amazon_site: Vec<String>,
    pub other_accounts: Vec<String>,
}

impl ProfileResponse {
    fn from_profile(email: String, profile: Profile) -> Self {
        Self {
            id: profile.user_id,
            email,
            first_name: profile.first_name,
            last_name: profile.last_name,
            job_title: profile.job_title,
            amazon_site: profile.amazon_site,
            other_accounts: profile.other_accounts,
        }
    }
}

/// Body of `PUT /setup-profile`. The list fields arrive in whatever shape
/// the client produced, so they stay untyped until normalization.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetupProfileRequest {
    pub token: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub amazon_site: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub other_accounts: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub amazon_site: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SetupProfileResponse {
    pub message: String,
    pub profile: ProfileResponse,
}

#[utoipa::path(
    put,
    path = "/setup-profile",
    request_body = SetupProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = SetupProfileResponse),
        (status = 400, description = "Invalid token or fields", body = MessageResponse),
        (status = 403, description = "Email not verified", body = MessageResponse),
        (status = 404, description = "Account no longer exists", body = MessageResponse)
    ),
    tag = "profile"
)]
pub async fn setup_profile(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<SetupProfileRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let account_id = decode_verify_token(state.config().token_secret(), request.token.trim())?;
    let account = store::find_account_by_id(&pool, account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    if !account.is_verified {
        return Err(ApiError::Forbidden(
            "Please verify your email first".to_string(),
        ));
    }

    let first_name = request.first_name.as_deref().and_then(clean_text);
    let last_name = request.last_name.as_deref().and_then(clean_text);
    let job_title = request.job_title.as_deref().and_then(clean_text);

    let amazon_site: Vec<String> = parse_list_field("amazon_site", request.amazon_site.as_ref())?
        .iter()
        .map(|entry| canonical_site_label(entry))
        .collect();
    let other_accounts = parse_list_field("other_accounts", request.other_accounts.as_ref())?;

    // Merge-by-omission for the list columns: a request that leaves a list
    // out (or empties it) keeps whatever is already stored.
    let stored = store::find_profile(&pool, account_id).await?;
    let amazon_site = merge_list(amazon_site, stored.as_ref().map(|p| p.amazon_site.clone()));
    let other_accounts = merge_list(
        other_accounts,
        stored.as_ref().map(|p| p.other_accounts.clone()),
    );

    let profile = store::save_profile(
        &pool,
        account_id,
        first_name.as_deref(),
        last_name.as_deref(),
        job_title.as_deref(),
        &amazon_site,
        &other_accounts,
    )
    .await?;

    // The profile is committed; losing the site rows only degrades the
    // sites listing until the next save.
    let specs: Vec<SiteSpec> = amazon_site
        .iter()
        .map(|label| SiteSpec {
            slug: site_slug(label),
            label: label.clone(),
        })
        .collect();
    log_best_effort(
        "site sync",
        store::sync_sites(&pool, account_id, &specs).await,
    );

    Ok(Json(SetupProfileResponse {
        message: "Profile saved. Please log in.".to_string(),
        profile: ProfileResponse::from_profile(account.email, profile),
    }))
}

fn merge_list(incoming: Vec<String>, stored: Option<Vec<String>>) -> Vec<String> {
    if incoming.is_empty() {
        stored.unwrap_or_default()
    } else {
        incoming
    }
}

#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "The caller's profile", body = ProfileResponse),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 404, description = "No profile row", body = MessageResponse)
    ),
    tag = "profile"
)]
pub async fn get_profile(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, state.config())?;

    let profile = store::find_profile(&pool, principal.account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(ProfileResponse::from_profile(
        principal.email,
        profile,
    )))
}

#[utoipa::path(
    put,
    path = "/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Default site updated", body = ProfileResponse),
        (status = 400, description = "Missing or empty site", body = MessageResponse),
        (status = 401, description = "No valid session", body = MessageResponse),
        (status = 404, description = "No profile row", body = MessageResponse)
    ),
    tag = "profile"
)]
pub async fn update_profile(
    pool: Extension<PgPool>,
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<UpdateProfileRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, state.config())?;

    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    // "Amazon YYC1", "amazon yyc1", and "yyc1" all name the same site.
    let slug = site_slug(&request.amazon_site);
    if slug.is_empty() {
        return Err(ApiError::Validation("Amazon site is required".to_string()));
    }
    let site = SiteSpec {
        label: format!("Amazon {slug}"),
        slug,
    };

    let profile = store::promote_default_site(&pool, principal.account_id, &site)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    if let Some(base_url) = state.config().dashboard_base_url() {
        log_best_effort(
            "dashboard notify",
            notify_default_site(base_url, principal.account_id, &site.slug).await,
        );
    }

    Ok(Json(ProfileResponse::from_profile(
        principal.email,
        profile,
    )))
}
