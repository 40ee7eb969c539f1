//! Best-effort notification of the external dashboard service.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::json;
use tracing::error;

use crate::APP_USER_AGENT;

/// Log-and-discard for best-effort side writes. The swallow is deliberate:
/// the primary operation has already succeeded when this runs.
pub fn log_best_effort(what: &str, result: Result<()>) {
    if let Err(err) = result {
        error!("{what} failed: {err:?}");
    }
}

/// Tell the dashboard service about an account's new default site.
///
/// # Errors
/// Returns an error on a transport failure or a non-success status; callers
/// route the result through `log_best_effort`.
pub async fn notify_default_site(base_url: &str, account_id: i64, site_slug: &str) -> Result<()> {
    let client = Client::builder()
        .user_agent(APP_USER_AGENT)
        .build()
        .context("failed to build dashboard client")?;

    let url = format!("{}/internal/default-site", base_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .json(&json!({ "user_id": account_id, "site": site_slug }))
        .send()
        .await
        .with_context(|| format!("failed to reach dashboard at {url}"))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "dashboard rejected default-site update: {}",
            response.status()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_best_effort_swallows_errors() {
        // Must not panic or propagate.
        log_best_effort("site sync", Err(anyhow!("boom")));
        log_best_effort("site sync", Ok(()));
    }
}
