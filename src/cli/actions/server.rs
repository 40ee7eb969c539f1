use crate::api::{
    self,
    email::{LogMailer, Mailer, SmtpMailer},
    state::{AppConfig, AppState},
};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub token_secret: SecretString,
    pub frontend_base_url: String,
    pub dashboard_base_url: Option<String>,
    pub smtp: Option<SmtpArgs>,
}

#[derive(Debug)]
pub struct SmtpArgs {
    pub relay: String,
    pub username: String,
    pub password: SecretString,
    pub from: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the SMTP transport cannot be built or the server
/// fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let mailer: Arc<dyn Mailer> = match &args.smtp {
        Some(smtp) => {
            info!(relay = %smtp.relay, "Sending email through SMTP relay");
            Arc::new(SmtpMailer::new(
                &smtp.relay,
                &smtp.username,
                smtp.password.expose_secret(),
                &smtp.from,
            )?)
        }
        None => {
            info!("No SMTP relay configured, logging outbound email");
            Arc::new(LogMailer)
        }
    };

    let config = AppConfig::new(args.token_secret)
        .with_frontend_base_url(args.frontend_base_url)
        .with_dashboard_base_url(args.dashboard_base_url);

    let state = Arc::new(AppState::new(config, mailer));

    api::serve(args.port, args.dsn, state).await
}
