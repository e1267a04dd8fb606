//! Notification delivery — SMTP via lettre, or log-only when disabled.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use tracing::info;

use crate::config::EmailSettings;
use crate::error::NotifyError;
use crate::notify::message::Notification;

/// Notification delivery collaborator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a rendered notification.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// SMTP notifier backed by lettre.
pub struct SmtpNotifier {
    settings: EmailSettings,
}

impl SmtpNotifier {
    pub fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }

    /// Build the outgoing message, attaching source files that still exist.
    fn build_message(&self, notification: &Notification) -> Result<Message, NotifyError> {
        let from = self
            .settings
            .from_address
            .parse()
            .map_err(|e| NotifyError::InvalidRecipient(format!("from address: {e}")))?;
        let to = notification
            .to
            .parse()
            .map_err(|e| NotifyError::InvalidRecipient(format!("to address: {e}")))?;

        let mut multipart = MultiPart::mixed().singlepart(SinglePart::plain(notification.body.clone()));

        for path in &notification.attachments {
            if !path.exists() {
                tracing::warn!(path = %path.display(), "Skipping missing attachment");
                continue;
            }
            let content = std::fs::read(path)?;
            let filename = path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "attachment".to_string());
            let content_type = ContentType::parse("application/octet-stream")
                .map_err(|e| NotifyError::Message(format!("content type: {e}")))?;
            multipart = multipart.singlepart(Attachment::new(filename).body(content, content_type));
        }

        Message::builder()
            .from(from)
            .to(to)
            .subject(notification.subject.as_str())
            .multipart(multipart)
            .map_err(|e| NotifyError::Message(format!("Failed to build email: {e}")))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = self.build_message(notification)?;

        let host = self.settings.smtp_host.clone();
        let port = self.settings.smtp_port;
        let creds = Credentials::new(
            self.settings.username.clone(),
            self.settings.password.expose_secret().to_string(),
        );

        // lettre's SmtpTransport is blocking; keep it off the runtime threads.
        let recipient = notification.to.clone();
        tokio::task::spawn_blocking(move || {
            let transport = SmtpTransport::relay(&host)
                .map_err(|e| NotifyError::Send(format!("SMTP relay error: {e}")))?
                .port(port)
                .credentials(creds)
                .build();

            transport
                .send(&email)
                .map_err(|e| NotifyError::Send(format!("SMTP send failed: {e}")))?;
            Ok::<_, NotifyError>(())
        })
        .await
        .map_err(|e| NotifyError::Send(format!("send task panicked: {e}")))??;

        info!(to = %recipient, "Notification email sent");
        Ok(())
    }
}

/// Fallback notifier used when SMTP is not configured — logs the rendered
/// message instead of sending it.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            "Email sending disabled; notification logged only"
        );
        Ok(())
    }
}
