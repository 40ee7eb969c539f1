//! Application configuration and shared request state.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use url::Url;

use super::email::Mailer;

const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:5173";

/// Environment-driven settings shared by every handler.
#[derive(Clone, Debug)]
pub struct AppConfig {
    frontend_base_url: String,
    token_secret: SecretString,
    dashboard_base_url: Option<String>,
    session_cookie_secure: bool,
}

impl AppConfig {
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self {
            frontend_base_url: DEFAULT_FRONTEND_BASE_URL.to_string(),
            token_secret,
            dashboard_base_url: None,
            session_cookie_secure: false,
        }
    }

    #[must_use]
    pub fn with_frontend_base_url(mut self, url: String) -> Self {
        // Cookies are only marked Secure when the frontend is on HTTPS.
        self.session_cookie_secure = Url::parse(&url)
            .map(|parsed| parsed.scheme() == "https")
            .unwrap_or(false);
        self.frontend_base_url = url;
        self
    }

    #[must_use]
    pub fn with_dashboard_base_url(mut self, url: Option<String>) -> Self {
        self.dashboard_base_url = url;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    /// Raw bytes of the token-signing secret.
    #[must_use]
    pub fn token_secret(&self) -> &[u8] {
        self.token_secret.expose_secret().as_bytes()
    }

    #[must_use]
    pub fn dashboard_base_url(&self) -> Option<&str> {
        self.dashboard_base_url.as_deref()
    }

    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.session_cookie_secure
    }
}

/// Shared state handed to handlers through an axum `Extension`.
pub struct AppState {
    config: AppConfig,
    mailer: Arc<dyn Mailer>,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self { config, mailer }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn mailer(&self) -> Arc<dyn Mailer> {
        Arc::clone(&self.mailer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(frontend: &str) -> AppConfig {
        AppConfig::new(SecretString::from("secret"))
            .with_frontend_base_url(frontend.to_string())
    }

    #[test]
    fn defaults_are_local_dev() {
        let config = AppConfig::new(SecretString::from("secret"));
        assert_eq!(config.frontend_base_url(), DEFAULT_FRONTEND_BASE_URL);
        assert!(config.dashboard_base_url().is_none());
        assert!(!config.session_cookie_secure());
    }

    #[test]
    fn https_frontend_marks_cookies_secure() {
        assert!(config("https://portal.example.com").session_cookie_secure());
        assert!(!config("http://localhost:5173").session_cookie_secure());
    }

    #[test]
    fn token_secret_exposes_bytes() {
        let config = AppConfig::new(SecretString::from("secret"));
        assert_eq!(config.token_secret(), b"secret");
    }
}
