//! Outbound email: delivery abstraction and the two templates.
//!
//! Handlers never wait on delivery and never surface a send failure; mail
//! goes out through `send_in_background`, which runs the blocking SMTP call
//! on the blocking pool and logs errors. The default sender for local dev is
//! `LogMailer`, which logs the message and returns `Ok(())`.

use anyhow::{Context, Result};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Email delivery abstraction.
pub trait Mailer: Send + Sync {
    /// Deliver a message or return an error for the caller to log.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the message instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "email send stub"
        );
        Ok(())
    }
}

/// Real SMTP sender over a TLS relay.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a relay transport with credentials.
    ///
    /// # Errors
    /// Returns an error if the relay host or from address is invalid.
    pub fn new(relay: &str, username: &str, password: &str, from: &str) -> Result<Self> {
        let transport = SmtpTransport::relay(relay)
            .with_context(|| format!("invalid SMTP relay: {relay}"))?
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        let from = from
            .parse()
            .with_context(|| format!("invalid from address: {from}"))?;
        Ok(Self { transport, from })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(message
                .to
                .parse()
                .with_context(|| format!("invalid to address: {}", message.to))?)
            .subject(&message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())
            .context("failed to build email")?;

        self.transport
            .send(&email)
            .with_context(|| format!("failed to send email to {}", message.to))?;

        Ok(())
    }
}

/// Hand a message to the blocking pool and log the outcome; the caller's
/// response never depends on delivery.
pub fn send_in_background(mailer: Arc<dyn Mailer>, message: EmailMessage) {
    tokio::task::spawn_blocking(move || {
        if let Err(err) = mailer.send(&message) {
            error!(to = %message.to, "failed to send email: {err:?}");
        }
    });
}

/// Verification email with the frontend link embedding the token.
#[must_use]
pub fn verification_email(to: &str, verify_link: &str) -> EmailMessage {
    let html_body = format!(
        r#"<!doctype html>
<html lang="en">
<body style="margin:0;padding:24px;background:#f5f5f5;font-family:Arial,Helvetica,sans-serif;color:#111827;">
  <div style="max-width:600px;margin:0 auto;background:#ffffff;border-radius:8px;padding:28px;">
    <p style="font-size:16px;line-height:24px;">
      Thank you for creating an account! To finish signing up, please verify your email address.
    </p>
    <p style="font-size:16px;line-height:24px;">To confirm your email, please click this link:</p>
    <p style="text-align:center;">
      <a href="{verify_link}"
         style="display:inline-block;padding:14px 18px;font-size:16px;color:#ffffff;text-decoration:none;font-weight:600;border-radius:8px;background:#1f2937;">
        Verify Email
      </a>
    </p>
    <p style="font-size:12px;line-height:18px;color:#6b7280;">
      If the button doesn't work, copy and paste this URL into your browser:<br>
      <span style="word-break:break-all;color:#374151;">{verify_link}</span>
    </p>
  </div>
</body>
</html>
"#
    );

    EmailMessage {
        to: to.to_string(),
        subject: "Verify your DTG Portal account".to_string(),
        html_body,
    }
}

/// Password-reset email carrying the 6-digit one-time code.
#[must_use]
pub fn reset_code_email(to: &str, code: &str) -> EmailMessage {
    let html_body = format!(
        r#"<!doctype html>
<html lang="en">
<body style="margin:0;padding:24px;background:#f5f5f5;font-family:Arial,Helvetica,sans-serif;color:#111827;">
  <div style="max-width:600px;margin:0 auto;background:#ffffff;border-radius:8px;padding:28px;">
    <p style="font-size:16px;line-height:24px;">
      A password reset was requested for your DTG Portal account. Use this code to set a new password:
    </p>
    <p style="text-align:center;font-size:28px;letter-spacing:6px;font-weight:700;">{code}</p>
    <p style="font-size:14px;line-height:22px;">This code expires in 30 minutes.</p>
    <p style="font-size:12px;line-height:18px;color:#6b7280;">
      If you did not request this reset, you can ignore this email.
    </p>
  </div>
</body>
</html>
"#
    );

    EmailMessage {
        to: to.to_string(),
        subject: "Your DTG Portal password reset code".to_string(),
        html_body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_mailer_always_succeeds() {
        let message = verification_email("a@x.com", "https://portal/setup-profile?member=t");
        assert!(LogMailer.send(&message).is_ok());
    }

    #[test]
    fn verification_email_embeds_link() {
        let link = "https://portal.example.com/setup-profile?member=abc%2Bdef";
        let message = verification_email("a@x.com", link);
        assert_eq!(message.to, "a@x.com");
        assert!(message.subject.contains("Verify"));
        assert!(message.html_body.contains(link));
    }

    #[test]
    fn reset_code_email_embeds_code() {
        let message = reset_code_email("a@x.com", "042137");
        assert!(message.html_body.contains("042137"));
        assert!(message.html_body.contains("30 minutes"));
    }

    #[test]
    fn smtp_mailer_rejects_bad_from_address() {
        assert!(SmtpMailer::new("smtp.example.com", "user", "pass", "not an address").is_err());
    }
}
