//! Notification rendering and delivery.

pub mod mailer;
pub mod message;

pub use mailer::{LogNotifier, Notifier, SmtpNotifier};
pub use message::Notification;
