//! SQL for accounts, profiles, and sites.
//!
//! Reads take a pool reference; multi-statement writes open their own
//! transaction so a handler commits or rolls back exactly once per request.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{info_span, Instrument};

use super::models::{Account, Profile, Site};

/// Outcome when attempting to create a new account + empty profile.
#[derive(Debug)]
pub enum SignupOutcome {
    Created(i64),
    Conflict,
}

/// One site entry for synchronization: slug plus display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSpec {
    pub slug: String,
    pub label: String,
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, is_verified, email_verified_at, \
     profile_completed_at, password_reset_code, password_reset_expires_at, created_at, updated_at";

pub async fn find_account_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = $1");
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, Account>(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by email")
}

pub async fn find_account_by_id(pool: &PgPool, id: i64) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1");
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, Account>(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by id")
}

/// Create an account and its empty profile in one transaction.
///
/// A unique violation on the email maps to `SignupOutcome::Conflict` rather
/// than racing a separate existence pre-check.
pub async fn create_account(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
) -> Result<SignupOutcome> {
    let mut tx = pool.begin().await.context("begin signup transaction")?;

    let query = "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row: Result<(i64,), sqlx::Error> = sqlx::query_as(query)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let user_id = match row {
        Ok((id,)) => id,
        Err(err) => {
            if is_unique_violation(&err) {
                let _ = tx.rollback().await;
                return Ok(SignupOutcome::Conflict);
            }
            return Err(err).context("failed to insert account");
        }
    };

    let query = "INSERT INTO user_profiles (user_id) VALUES ($1)";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to insert profile")?;

    tx.commit().await.context("commit signup transaction")?;

    Ok(SignupOutcome::Created(user_id))
}

/// First verification sets the flag and timestamp; repeat calls match zero
/// rows, so the original `email_verified_at` survives.
pub async fn mark_email_verified(pool: &PgPool, id: i64) -> Result<()> {
    let query = "UPDATE users SET is_verified = TRUE, email_verified_at = NOW(), \
         updated_at = NOW() WHERE id = $1 AND is_verified = FALSE";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to mark email verified")?;
    Ok(())
}

/// Store a fresh reset code with a 30-minute expiry. Both fields move
/// together.
pub async fn set_reset_code(pool: &PgPool, id: i64, code: &str) -> Result<()> {
    let query = "UPDATE users SET password_reset_code = $2, \
         password_reset_expires_at = NOW() + INTERVAL '30 minutes', updated_at = NOW() \
         WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .bind(code)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store reset code")?;
    Ok(())
}

pub async fn clear_reset_code(pool: &PgPool, id: i64) -> Result<()> {
    let query = "UPDATE users SET password_reset_code = NULL, \
         password_reset_expires_at = NULL, updated_at = NOW() WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to clear reset code")?;
    Ok(())
}

/// Store the new password hash and clear both reset fields in one statement.
pub async fn apply_password_reset(pool: &PgPool, id: i64, password_hash: &str) -> Result<()> {
    let query = "UPDATE users SET password_hash = $2, password_reset_code = NULL, \
         password_reset_expires_at = NULL, updated_at = NOW() WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to apply password reset")?;
    Ok(())
}

const PROFILE_COLUMNS: &str =
    "id, user_id, first_name, last_name, job_title, amazon_site, other_accounts";

pub async fn find_profile(pool: &PgPool, user_id: i64) -> Result<Option<Profile>> {
    let query = format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1");
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    sqlx::query_as::<_, Profile>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup profile")
}

/// Upsert the profile row and stamp `profile_completed_at` in one
/// transaction. Field merging has already happened in the handler; this
/// writes the final values.
pub async fn save_profile(
    pool: &PgPool,
    user_id: i64,
    first_name: Option<&str>,
    last_name: Option<&str>,
    job_title: Option<&str>,
    amazon_site: &[String],
    other_accounts: &[String],
) -> Result<Profile> {
    let mut tx = pool.begin().await.context("begin profile transaction")?;

    let query = format!(
        "INSERT INTO user_profiles \
             (user_id, first_name, last_name, job_title, amazon_site, other_accounts) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (user_id) DO UPDATE SET \
             first_name = EXCLUDED.first_name, \
             last_name = EXCLUDED.last_name, \
             job_title = EXCLUDED.job_title, \
             amazon_site = EXCLUDED.amazon_site, \
             other_accounts = EXCLUDED.other_accounts \
         RETURNING {PROFILE_COLUMNS}"
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let profile = sqlx::query_as::<_, Profile>(&query)
        .bind(user_id)
        .bind(first_name)
        .bind(last_name)
        .bind(job_title)
        .bind(amazon_site)
        .bind(other_accounts)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await
        .context("failed to upsert profile")?;

    let query = "UPDATE users SET profile_completed_at = NOW(), updated_at = NOW() WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to stamp profile completion")?;

    tx.commit().await.context("commit profile transaction")?;

    Ok(profile)
}

pub async fn list_sites(pool: &PgPool, user_id: i64) -> Result<Vec<Site>> {
    let query = "SELECT id, user_id, site_slug, label, is_default, created_at \
         FROM user_sites WHERE user_id = $1 \
         ORDER BY is_default DESC, created_at ASC, id ASC";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    sqlx::query_as::<_, Site>(query)
        .bind(user_id)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list sites")
}

/// Drop later entries that repeat an earlier slug. Two labels can derive
/// the same slug ("CTZ" and "Amazon CTZ"); without this, the second upsert
/// would land on the first row and overwrite its default flag.
fn dedupe_by_slug(sites: &[SiteSpec]) -> Vec<&SiteSpec> {
    let mut seen = std::collections::HashSet::new();
    sites
        .iter()
        .filter(|site| seen.insert(site.slug.as_str()))
        .collect()
}

/// Rebuild the site collection from an ordered label list.
///
/// Clears every default flag for the account, then upserts each entry; the
/// first entry becomes the new default. Entries repeating an earlier slug
/// are skipped. Runs in its own transaction so a concurrent writer can
/// never observe two defaults.
pub async fn sync_sites(pool: &PgPool, user_id: i64, sites: &[SiteSpec]) -> Result<()> {
    let mut tx = pool.begin().await.context("begin site sync transaction")?;

    let query = "UPDATE user_sites SET is_default = FALSE WHERE user_id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to clear default sites")?;

    for (index, site) in dedupe_by_slug(sites).into_iter().enumerate() {
        let query = "INSERT INTO user_sites (user_id, site_slug, label, is_default) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, site_slug) DO UPDATE SET \
                 label = EXCLUDED.label, is_default = EXCLUDED.is_default";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user_id)
            .bind(&site.slug)
            .bind(&site.label)
            .bind(index == 0)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to upsert site")?;
    }

    tx.commit().await.context("commit site sync transaction")?;

    Ok(())
}

/// Make one site the account default and put its label first in the
/// profile's `amazon_site` array, atomically.
///
/// Returns `None` when the account has no profile row.
pub async fn promote_default_site(
    pool: &PgPool,
    user_id: i64,
    site: &SiteSpec,
) -> Result<Option<Profile>> {
    let mut tx = pool
        .begin()
        .await
        .context("begin default-site transaction")?;

    let query = format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1 FOR UPDATE");
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let Some(profile) = sqlx::query_as::<_, Profile>(&query)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to lock profile")?
    else {
        let _ = tx.rollback().await;
        return Ok(None);
    };

    // Chosen label first, remaining labels keep their order.
    let mut amazon_site = vec![site.label.clone()];
    amazon_site.extend(
        profile
            .amazon_site
            .iter()
            .filter(|label| *label != &site.label)
            .cloned(),
    );

    let query = format!(
        "UPDATE user_profiles SET amazon_site = $2 WHERE user_id = $1 RETURNING {PROFILE_COLUMNS}"
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let profile = sqlx::query_as::<_, Profile>(&query)
        .bind(user_id)
        .bind(&amazon_site)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await
        .context("failed to reorder profile sites")?;

    let query = "UPDATE user_sites SET is_default = FALSE WHERE user_id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to clear default sites")?;

    let query = "INSERT INTO user_sites (user_id, site_slug, label, is_default) \
         VALUES ($1, $2, $3, TRUE) \
         ON CONFLICT (user_id, site_slug) DO UPDATE SET \
             label = EXCLUDED.label, is_default = TRUE";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(&site.slug)
        .bind(&site.label)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to upsert default site")?;

    tx.commit().await.context("commit default-site transaction")?;

    Ok(Some(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    fn site(slug: &str, label: &str) -> SiteSpec {
        SiteSpec {
            slug: slug.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn dedupe_by_slug_keeps_first_occurrence() {
        let sites = vec![
            site("CTZ", "CTZ"),
            site("YYC1", "Amazon YYC1"),
            site("CTZ", "Amazon CTZ"),
        ];
        let deduped = dedupe_by_slug(&sites);
        assert_eq!(deduped.len(), 2);
        // The first entry survives so it still becomes the default.
        assert_eq!(deduped[0].label, "CTZ");
        assert_eq!(deduped[1].slug, "YYC1");
    }

    #[test]
    fn dedupe_by_slug_passes_unique_lists_through() {
        let sites = vec![site("CTZ", "Amazon CTZ"), site("YYC1", "Amazon YYC1")];
        let deduped = dedupe_by_slug(&sites);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
