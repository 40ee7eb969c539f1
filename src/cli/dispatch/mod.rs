use crate::cli::{
    actions::{server, Action},
    commands,
};
use anyhow::{anyhow, Result};
use clap::ArgMatches;
use secrecy::SecretString;

/// Turn parsed arguments into the action to run.
///
/// # Errors
///
/// Returns an error when a required argument is absent; clap enforces them
/// first, so this only fires when a caller bypasses `commands::new()`.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .ok_or_else(|| anyhow!("missing required argument: --{}", commands::ARG_PORT))?;

    let dsn = matches
        .get_one::<String>(commands::ARG_DSN)
        .cloned()
        .ok_or_else(|| anyhow!("missing required argument: --{}", commands::ARG_DSN))?;

    let token_secret = matches
        .get_one::<String>(commands::ARG_TOKEN_SECRET)
        .cloned()
        .map(SecretString::from)
        .ok_or_else(|| anyhow!("missing required argument: --{}", commands::ARG_TOKEN_SECRET))?;

    let frontend_base_url = matches
        .get_one::<String>(commands::ARG_FRONTEND_URL)
        .cloned()
        .ok_or_else(|| anyhow!("missing required argument: --{}", commands::ARG_FRONTEND_URL))?;

    let dashboard_base_url = matches
        .get_one::<String>(commands::ARG_DASHBOARD_URL)
        .cloned();

    let smtp = smtp_args(matches)?;

    Ok(Action::Server(server::Args {
        port,
        dsn,
        token_secret,
        frontend_base_url,
        dashboard_base_url,
        smtp,
    }))
}

fn smtp_args(matches: &ArgMatches) -> Result<Option<server::SmtpArgs>> {
    let Some(relay) = matches
        .get_one::<String>(commands::smtp::ARG_SMTP_RELAY)
        .cloned()
    else {
        return Ok(None);
    };

    // clap's `requires` covers the flag form; env-only configuration can
    // still arrive with holes, so check again here.
    let username = matches
        .get_one::<String>(commands::smtp::ARG_SMTP_USERNAME)
        .cloned()
        .ok_or_else(|| {
            anyhow!(
                "missing required argument: --{}",
                commands::smtp::ARG_SMTP_USERNAME
            )
        })?;
    let password = matches
        .get_one::<String>(commands::smtp::ARG_SMTP_PASSWORD)
        .cloned()
        .map(SecretString::from)
        .ok_or_else(|| {
            anyhow!(
                "missing required argument: --{}",
                commands::smtp::ARG_SMTP_PASSWORD
            )
        })?;
    let from = matches
        .get_one::<String>(commands::smtp::ARG_SMTP_FROM)
        .cloned()
        .ok_or_else(|| {
            anyhow!(
                "missing required argument: --{}",
                commands::smtp::ARG_SMTP_FROM
            )
        })?;

    Ok(Some(server::SmtpArgs {
        relay,
        username,
        password,
        from,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_builds_server_action() {
        temp_env::with_vars(
            [
                ("DTG_PORT", None::<&str>),
                ("DTG_DSN", Some("postgres://localhost/dtg")),
                ("DTG_TOKEN_SECRET", Some("super-secret")),
                ("DTG_FRONTEND_URL", Some("https://portal.example.com")),
                ("DTG_DASHBOARD_URL", None),
                ("DTG_SMTP_RELAY", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec!["dtg-portal"]);
                let action = handler(&matches).unwrap();
                let Action::Server(args) = action;
                assert_eq!(args.port, 8080);
                assert_eq!(args.dsn, "postgres://localhost/dtg");
                assert_eq!(args.frontend_base_url, "https://portal.example.com");
                assert!(args.dashboard_base_url.is_none());
                assert!(args.smtp.is_none());
            },
        );
    }

    #[test]
    fn handler_collects_smtp_args() {
        temp_env::with_vars(
            [
                ("DTG_DSN", Some("postgres://localhost/dtg")),
                ("DTG_TOKEN_SECRET", Some("super-secret")),
                ("DTG_SMTP_RELAY", Some("smtp.example.com")),
                ("DTG_SMTP_USERNAME", Some("mailer")),
                ("DTG_SMTP_PASSWORD", Some("hunter2")),
                ("DTG_SMTP_FROM", Some("no-reply@example.com")),
            ],
            || {
                let matches = commands::new().get_matches_from(vec!["dtg-portal"]);
                let Action::Server(args) = handler(&matches).unwrap();
                let smtp = args.smtp.expect("smtp args");
                assert_eq!(smtp.relay, "smtp.example.com");
                assert_eq!(smtp.username, "mailer");
                assert_eq!(smtp.from, "no-reply@example.com");
            },
        );
    }

    #[test]
    fn handler_rejects_partial_smtp_env() {
        temp_env::with_vars(
            [
                ("DTG_DSN", Some("postgres://localhost/dtg")),
                ("DTG_TOKEN_SECRET", Some("super-secret")),
                ("DTG_SMTP_RELAY", Some("smtp.example.com")),
                ("DTG_SMTP_USERNAME", None::<&str>),
                ("DTG_SMTP_PASSWORD", None),
                ("DTG_SMTP_FROM", None),
            ],
            || {
                let result = commands::new().try_get_matches_from(vec!["dtg-portal"]);
                // clap enforces the pairing even when the relay comes from
                // the environment; a bypassed parse still fails in handler.
                match result {
                    Ok(matches) => assert!(handler(&matches).is_err()),
                    Err(_) => {}
                }
            },
        );
    }
}
