use clap::{Arg, Command};

pub const ARG_SMTP_RELAY: &str = "smtp-relay";
pub const ARG_SMTP_USERNAME: &str = "smtp-username";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";
pub const ARG_SMTP_FROM: &str = "smtp-from";

/// Without a relay the server falls back to logging outbound email.
#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_RELAY)
                .long(ARG_SMTP_RELAY)
                .help("SMTP relay host; omit to log emails instead of sending")
                .env("DTG_SMTP_RELAY")
                .requires(ARG_SMTP_USERNAME)
                .requires(ARG_SMTP_PASSWORD)
                .requires(ARG_SMTP_FROM),
        )
        .arg(
            Arg::new(ARG_SMTP_USERNAME)
                .long(ARG_SMTP_USERNAME)
                .help("SMTP relay username")
                .env("DTG_SMTP_USERNAME"),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP relay password")
                .env("DTG_SMTP_PASSWORD"),
        )
        .arg(
            Arg::new(ARG_SMTP_FROM)
                .long(ARG_SMTP_FROM)
                .help("From address for outbound email")
                .env("DTG_SMTP_FROM"),
        )
}
