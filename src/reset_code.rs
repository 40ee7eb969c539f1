//! Six-digit one-time codes for the password-reset flow.

use rand::{rngs::OsRng, Rng};

/// Generate a 6-digit numeric code, left-padded with zeros.
///
/// Uniform over `000000`..=`999999`. Codes are not globally unique; they are
/// scoped to one account and time-boxed by `password_reset_expires_at`.
#[must_use]
pub fn generate() -> String {
    let n: u32 = OsRng.gen_range(0..1_000_000);
    format!("{n:06}")
}

/// Check that a caller-supplied code is exactly six ASCII digits.
#[must_use]
pub fn is_well_formed(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}
