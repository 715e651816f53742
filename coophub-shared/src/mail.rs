/// Outgoing mail
///
/// The API server only needs two messages: the email-confirmation link sent on
/// registration and the password-reset link. Both carry a single-use hash in
/// their URL path (`confirm-email/<hash>`, `password-change/<hash>`) which the
/// frontend posts back.
///
/// [`LogMailer`] writes messages to the tracing log; [`MemoryMailer`] keeps
/// them for inspection in tests.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Failed to send mail: {0}")]
    SendFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Mailer that logs each message instead of delivering it
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        info!(
            from = %self.from,
            to = %message.to,
            subject = %message.subject,
            text = %message.text,
            "Mail sent"
        );
        Ok(())
    }
}

/// Mailer that records messages in memory
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent message addressed to `to`
    pub fn last_to(&self, to: &str) -> Option<MailMessage> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        Ok(())
    }
}

fn link(frontend_domain: &str, path: &str, hash: &str) -> String {
    format!("{}/{}/{}", frontend_domain.trim_end_matches('/'), path, hash)
}

/// Registration message carrying the `confirm-email/<hash>` link
pub fn confirm_email_message(frontend_domain: &str, to: &str, hash: &str) -> MailMessage {
    MailMessage {
        to: to.to_string(),
        subject: "Confirm email".to_string(),
        text: format!(
            "Confirm your email: {}",
            link(frontend_domain, "confirm-email", hash)
        ),
    }
}

/// Forgot-password message carrying the `password-change/<hash>` link
pub fn reset_password_message(frontend_domain: &str, to: &str, hash: &str) -> MailMessage {
    MailMessage {
        to: to.to_string(),
        subject: "Reset password".to_string(),
        text: format!(
            "Reset your password: {}",
            link(frontend_domain, "password-change", hash)
        ),
    }
}

/// Extracts the hash following `marker/` in a message body
pub fn extract_hash<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    let rest = text[start..].strip_prefix('/')?;
    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());

    (end > 0).then(|| &rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_message_contains_link() {
        let message = confirm_email_message("http://localhost:3000/", "a@example.com", "abc123");

        assert_eq!(message.to, "a@example.com");
        assert!(message
            .text
            .contains("http://localhost:3000/confirm-email/abc123"));
        assert_eq!(extract_hash(&message.text, "confirm-email"), Some("abc123"));
    }

    #[test]
    fn test_reset_message_contains_link() {
        let message = reset_password_message("https://app.example.com", "a@example.com", "f00d");
        assert_eq!(extract_hash(&message.text, "password-change"), Some("f00d"));
        assert_eq!(extract_hash(&message.text, "confirm-email"), None);
    }

    #[test]
    fn test_extract_hash_requires_value() {
        assert_eq!(extract_hash("see confirm-email/", "confirm-email"), None);
        assert_eq!(extract_hash("see confirm-email", "confirm-email"), None);
    }

    #[tokio::test]
    async fn test_memory_mailer_records() {
        let mailer = MemoryMailer::new();
        mailer
            .send(confirm_email_message("http://x", "a@example.com", "h1"))
            .await
            .unwrap();
        mailer
            .send(reset_password_message("http://x", "a@example.com", "h2"))
            .await
            .unwrap();

        assert_eq!(mailer.sent().len(), 2);
        assert_eq!(mailer.last_to("a@example.com").unwrap().subject, "Reset password");
        assert!(mailer.last_to("b@example.com").is_none());
    }

    #[tokio::test]
    async fn test_log_mailer_accepts() {
        let mailer = LogMailer::new("noreply@example.com");
        assert!(mailer
            .send(confirm_email_message("http://x", "a@example.com", "h"))
            .await
            .is_ok());
    }
}
