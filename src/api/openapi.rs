//! The generated OpenAPI document, served through Swagger UI.

use utoipa::OpenApi;

use super::handlers::{auth, health, me, profile};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "dtg-portal",
        description = "Account, verification, and profile API for the DTG portal"
    ),
    paths(
        health::health,
        me::me,
        auth::signup::signup,
        auth::verification::verify_email,
        auth::verification::resend_verification,
        auth::eligibility::check_member,
        auth::login::login,
        auth::password_reset::forgot_password,
        auth::password_reset::reset_password,
        auth::session::logout,
        profile::setup_profile,
        profile::get_profile,
        profile::update_profile,
        profile::sites::list_sites,
    ),
    components(schemas(
        health::Health,
        me::MeResponse,
        auth::types::MessageResponse,
        auth::types::SignupRequest,
        auth::types::ResendVerificationRequest,
        auth::types::VerifyEmailRequest,
        auth::types::VerifyEmailResponse,
        auth::types::CheckMemberRequest,
        auth::types::CheckMemberResponse,
        auth::types::LoginRequest,
        auth::types::LoginResponse,
        auth::types::ForgotPasswordRequest,
        auth::types::ResetPasswordRequest,
        profile::ProfileResponse,
        profile::SetupProfileRequest,
        profile::SetupProfileResponse,
        profile::UpdateProfileRequest,
        profile::sites::SiteResponse,
    )),
    tags(
        (name = "auth", description = "Signup, verification, login, password reset"),
        (name = "profile", description = "Profile setup and site management"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
