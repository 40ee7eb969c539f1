//! Small helpers for auth validation and link building.

use regex::Regex;

pub(crate) const MIN_PASSWORD_CHARS: usize = 8;

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(crate) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

pub(crate) fn valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_CHARS
}

/// Build the frontend setup link with the url-encoded verification token.
pub(crate) fn build_setup_link(frontend_base_url: &str, token: &str) -> String {
    let base = frontend_base_url.trim_end_matches('/');
    let encoded: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
    format!("{base}/setup-profile?member={encoded}")
}
