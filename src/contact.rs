//! Contact form intake
//!
//! Submissions are write-once. The notification email is a side effect: the
//! message is persisted first and a mailer failure degrades to a logged
//! warning, never a rolled-back submission.

use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::{require_field, AppError};
use crate::mailer::{Mailer, OutboundEmail};
use crate::models::ContactMessage;
use crate::store::Store;

#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

fn validate_email(email: &str) -> Result<String, AppError> {
    let email = require_field(email, "email")?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if !valid {
        return Err(AppError::Validation(
            "must be a valid email address".into(),
        ));
    }
    Ok(email)
}

/// Persist the submission, then notify the site owner by email
pub async fn submit(
    store: &dyn Store,
    mailer: &dyn Mailer,
    notify_to: &str,
    new: NewContact,
) -> Result<ContactMessage, AppError> {
    let name = require_field(&new.name, "name")?;
    let email = validate_email(&new.email)?;
    let subject = require_field(&new.subject, "subject")?;
    let body = require_field(&new.message, "message")?;

    let message = ContactMessage {
        id: Uuid::new_v4(),
        name,
        email,
        subject,
        message: body,
        created_at: chrono::Utc::now(),
    };
    store.create_contact(message.clone()).await?;

    let notification = OutboundEmail {
        to: notify_to.to_string(),
        subject: format!("New contact message: {}", message.subject),
        text: format!(
            "From: {} <{}>\n\n{}",
            message.name, message.email, message.message
        ),
        html: format!(
            "<p><strong>From:</strong> {} &lt;{}&gt;</p><p>{}</p>",
            message.name, message.email, message.message
        ),
    };
    if let Err(e) = mailer.send(notification).await {
        warn!("contact notification email failed: {}", e);
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, _email: OutboundEmail) -> Result<(), AppError> {
            if self.fail {
                return Err(AppError::Upstream("smtp down".into()));
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn submission() -> NewContact {
        NewContact {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            subject: "Hello".into(),
            message: "Nice site".into(),
        }
    }

    #[tokio::test]
    async fn test_submit_persists_and_notifies() {
        let store = MemoryStore::new();
        let mailer = RecordingMailer::default();
        let saved = submit(&store, &mailer, "owner@example.com", submission())
            .await
            .unwrap();
        assert_eq!(saved.name, "Ada");
        assert_eq!(mailer.sent.load(Ordering::SeqCst), 1);
        assert_eq!(store.list_contacts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mailer_failure_does_not_fail_submission() {
        let store = MemoryStore::new();
        let mailer = RecordingMailer {
            fail: true,
            ..Default::default()
        };
        let result = submit(&store, &mailer, "owner@example.com", submission()).await;
        assert!(result.is_ok());
        // the write-once record stays committed
        assert_eq!(store.list_contacts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let store = MemoryStore::new();
        let mailer = RecordingMailer::default();
        for bad in ["not-an-email", "a@b", "@example.com", ""] {
            let mut new = submission();
            new.email = bad.into();
            let err = submit(&store, &mailer, "owner@example.com", new)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{}", bad);
        }
        assert_eq!(mailer.sent.load(Ordering::SeqCst), 0);
    }
}
