//! Mail delivery adapters and templates

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::application::ports::{EmailMessage, EmailSender, MailError};

/// Sender that logs the envelope instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            body_len = message.html_body.len(),
            "📧 Email send stub"
        );
        Ok(())
    }
}

/// Sender that keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
}

impl MemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<EmailMessage> {
        self.sent().pop()
    }
}

#[async_trait]
impl EmailSender for MemoryEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        self.sent
            .lock()
            .map_err(|_| MailError::Transport("outbox lock poisoned".into()))?
            .push(message.clone());
        Ok(())
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// HTML body of the password-reset email.
pub fn render_reset_email(link: &str, ttl_minutes: i64) -> String {
    let unit = if ttl_minutes == 1 { "minute" } else { "minutes" };
    format!(
        r#"<p>Dear User,</p>

<p>We received a request to reset your password for your BPIT Alumni Website account.</p>

<p>Please click the link below to change your password:</p>

<p><a href="{href}"><strong>Click Here</strong></a></p>

<p>This link is valid for the next {ttl} {unit}. If you did not request a password reset, please ignore this email and your password will remain unchanged.</p>

<p>If you have any questions or need further assistance, feel free to contact our support team.</p>

<p>Best regards,</p>
<p>BPIT Team</p>

<hr>
<p>Bhagwan Parshuram Institute of Technology</p>
<p>Alumni Association</p>
<p><a href="https://alumni.bpitindia.com/">BPIT Alumni Website</a></p>
"#,
        href = escape_attr(link),
        ttl = ttl_minutes,
        unit = unit,
    )
}
