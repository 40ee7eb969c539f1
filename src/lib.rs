//! # DTG Portal backend
//!
//! Account, verification, and profile service for the DTG portal frontend.
//!
//! ## Accounts and verification
//!
//! Signup stores a bcrypt password hash and an empty profile, then emails a
//! verification link carrying an HS256 token (30-day TTL). Verification is
//! idempotent; the first call stamps `email_verified_at`. Profile setup is
//! gated on the same token plus a 30-day eligibility window checked by
//! `POST /check-member`.
//!
//! ## Sessions
//!
//! Login mints a 12-hour session JWT, returned in the body and as an
//! `HttpOnly` cookie. There is no server-side session storage; logout just
//! clears the cookie.
//!
//! ## Password reset
//!
//! `POST /forgot-password` stores a 6-digit code with a 30-minute expiry and
//! emails it; `POST /reset-password` consumes it. Responses never reveal
//! whether an email is registered.
//!
//! ## Profiles and sites
//!
//! The profile row carries free-text fields plus `amazon_site` and
//! `other_accounts` arrays; `user_sites` mirrors the site labels with at
//! most one default per account, mirrored to an optional external dashboard
//! service.

pub mod account;
pub mod api;
pub mod cli;
pub mod reset_code;
pub mod token;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
