//! Outbound mailer port and SMTP adapter
//!
//! Transient SMTP failures are reported as `AppError::Upstream` and must be
//! handled by callers as a degraded side effect, never an uncaught crash.

use async_trait::async_trait;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::error::AppError;

/// One outbound message
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), AppError>;
}

/// SMTP adapter (STARTTLS relay, password auth)
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        from: &str,
    ) -> Result<Self, AppError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| AppError::Internal(format!("smtp transport: {}", e)))?
            .port(port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        Ok(Self {
            transport,
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), AppError> {
        let message = Message::builder()
            .from(
                format!("Portfolio Contact <{}>", self.from)
                    .parse()
                    .map_err(|e| AppError::Internal(format!("from address: {}", e)))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| AppError::Validation(format!("invalid recipient: {}", e)))?)
            .subject(&email.subject)
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))
            .map_err(|e| AppError::Internal(format!("message build: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Upstream(format!("smtp send: {}", e)))?;

        info!("notification email sent to {}", email.to);
        Ok(())
    }
}
