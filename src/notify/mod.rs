// src/notify/mod.rs
mod mailer;
mod notifier;

pub use mailer::{compose_message, AttachmentFile, SmtpCredentials, SmtpNotifier};
pub use notifier::{LogNotifier, Notifier, NotifyError};
