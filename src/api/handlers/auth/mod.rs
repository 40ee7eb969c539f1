//! Signup, verification, login, and password-reset endpoints.

pub mod eligibility;
pub mod login;
pub mod password_reset;
pub mod session;
pub mod signup;
pub mod types;
pub mod utils;
pub mod verification;
