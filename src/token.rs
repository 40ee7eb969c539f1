//! Signed, self-expiring tokens for email verification and sessions.
//!
//! Both token kinds are HS256 JWTs minted with the same process-wide secret
//! but with incompatible claim shapes: a verification token carries a
//! `purpose` claim and no email, a session token carries an email and no
//! `purpose`. Decoding one as the other always fails.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Verification tokens live as long as the profile-setup window so the
/// cryptographic expiry and the 30-day business rule never disagree.
pub const VERIFY_TOKEN_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Session tokens are short-lived; a new one is minted at every login.
pub const SESSION_TOKEN_TTL_SECONDS: i64 = 12 * 60 * 60;

const VERIFY_PURPOSE: &str = "verify";

/// Decode failure for untrusted input. Deliberately carries no detail about
/// which check failed.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid or expired token")]
    Invalid,
}

#[derive(Debug, Serialize, Deserialize)]
struct VerifyClaims {
    sub: String,
    purpose: String,
    iat: i64,
    exp: i64,
}

/// Claims carried by a login session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a verification token bound to one account id.
///
/// # Errors
/// Returns an error if JWT encoding fails.
pub fn issue_verify_token(secret: &[u8], account_id: i64) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = VerifyClaims {
        sub: account_id.to_string(),
        purpose: VERIFY_PURPOSE.to_string(),
        iat: now,
        exp: now + VERIFY_TOKEN_TTL_SECONDS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .context("failed to encode verification token")
}

/// Decode a verification token back to its account id.
///
/// # Errors
/// Returns `TokenError::Invalid` on a bad signature, malformed token,
/// expired token, wrong purpose, or non-numeric subject.
pub fn decode_verify_token(secret: &[u8], token: &str) -> Result<i64, TokenError> {
    let data = decode::<VerifyClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .map_err(|_| TokenError::Invalid)?;

    if data.claims.purpose != VERIFY_PURPOSE {
        return Err(TokenError::Invalid);
    }

    data.claims.sub.parse().map_err(|_| TokenError::Invalid)
}

/// Issue a session token for a successful login.
///
/// # Errors
/// Returns an error if JWT encoding fails.
pub fn issue_session_token(secret: &[u8], account_id: i64, email: &str) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: account_id.to_string(),
        email: email.to_string(),
        iat: now,
        exp: now + SESSION_TOKEN_TTL_SECONDS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .context("failed to encode session token")
}

/// Decode a session token.
///
/// # Errors
/// Returns `TokenError::Invalid` on any decode or validation failure.
pub fn decode_session_token(secret: &[u8], token: &str) -> Result<SessionClaims, TokenError> {
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .map_err(|_| TokenError::Invalid)?;

    if data.claims.email.trim().is_empty() {
        return Err(TokenError::Invalid);
    }

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn verify_token_round_trips_to_same_id() -> Result<()> {
        let token = issue_verify_token(SECRET, 5)?;
        assert_eq!(decode_verify_token(SECRET, &token), Ok(5));
        Ok(())
    }

    #[test]
    fn verify_token_rejects_tampered_signature() -> Result<()> {
        let token = issue_verify_token(SECRET, 5)?;
        let mut tampered = token.clone();
        // flip the last signature character
        let last = tampered.pop().map_or('A', |c| if c == 'A' { 'B' } else { 'A' });
        tampered.push(last);
        assert_eq!(decode_verify_token(SECRET, &tampered), Err(TokenError::Invalid));
        Ok(())
    }

    #[test]
    fn verify_token_rejects_wrong_secret() -> Result<()> {
        let token = issue_verify_token(SECRET, 5)?;
        assert_eq!(
            decode_verify_token(b"other-secret", &token),
            Err(TokenError::Invalid)
        );
        Ok(())
    }

    #[test]
    fn verify_token_rejects_garbage() {
        assert_eq!(decode_verify_token(SECRET, ""), Err(TokenError::Invalid));
        assert_eq!(
            decode_verify_token(SECRET, "not-a-token"),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn verify_token_rejects_expired() -> Result<()> {
        let now = Utc::now().timestamp();
        let claims = VerifyClaims {
            sub: "5".to_string(),
            purpose: VERIFY_PURPOSE.to_string(),
            iat: now - VERIFY_TOKEN_TTL_SECONDS - 3600,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )?;
        assert_eq!(decode_verify_token(SECRET, &token), Err(TokenError::Invalid));
        Ok(())
    }

    #[test]
    fn session_token_is_not_a_verify_token() -> Result<()> {
        let token = issue_session_token(SECRET, 5, "a@x.com")?;
        assert_eq!(decode_verify_token(SECRET, &token), Err(TokenError::Invalid));
        Ok(())
    }

    #[test]
    fn verify_token_is_not_a_session_token() -> Result<()> {
        let token = issue_verify_token(SECRET, 5)?;
        assert!(decode_session_token(SECRET, &token).is_err());
        Ok(())
    }

    #[test]
    fn session_token_round_trips() -> Result<()> {
        let token = issue_session_token(SECRET, 7, "a@x.com")?;
        let claims = decode_session_token(SECRET, &token)
            .map_err(|err| anyhow::anyhow!("decode failed: {err}"))?;
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "a@x.com");
        assert!(claims.exp > claims.iat);
        Ok(())
    }
}
