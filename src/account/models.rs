//! Row types for accounts, profiles, and sites.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One row of `users`.
///
/// `password_reset_code` and `password_reset_expires_at` are both null or
/// both set; `email_verified_at` is set exactly when `is_verified` is true.
/// Both pairs are also enforced by CHECK constraints in the schema.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub profile_completed_at: Option<DateTime<Utc>>,
    pub password_reset_code: Option<String>,
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of `user_profiles` (1:1 with `users`, created at signup).
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub amazon_site: Vec<String>,
    pub other_accounts: Vec<String>,
}

/// One row of `user_sites`. At most one row per account has
/// `is_default = true`, backed by a partial unique index.
#[derive(Debug, Clone, FromRow)]
pub struct Site {
    pub id: i64,
    pub user_id: i64,
    pub site_slug: String,
    pub label: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}
