// src/notify/mailer.rs
use super::notifier::{NotifyError, Notifier};
use crate::config::{NotifyConfig, SmtpConfig, TlsMode};
use crate::report::EmailContent;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;
use tracing::{debug, info};

/// Login read from the environment. The username doubles as the sender.
#[derive(Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl SmtpCredentials {
    pub fn from_env(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| NotifyError::MissingCredential(name.to_string()))
        };

        Ok(Self {
            username: read(config.username_env.as_str())?,
            password: read(config.password_env.as_str())?,
        })
    }
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A static file attached to every email.
#[derive(Debug, Clone)]
pub struct AttachmentFile {
    pub filename: String,
    pub content_type: ContentType,
    pub content: Vec<u8>,
}

impl AttachmentFile {
    pub async fn load(path: &Path) -> Result<Self, NotifyError> {
        let content = tokio::fs::read(path)
            .await
            .map_err(|source| NotifyError::Attachment {
                path: path.to_path_buf(),
                source,
            })?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();

        Ok(Self {
            content_type: content_type_for(path),
            filename,
            content,
        })
    }
}

fn content_type_for(path: &Path) -> ContentType {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let mime = match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    };

    ContentType::parse(mime).unwrap_or(ContentType::TEXT_PLAIN)
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse()
        .map_err(|source| NotifyError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}

/// Build a multipart/mixed message: plaintext body plus optional attachment.
pub fn compose_message(
    from: &Mailbox,
    recipients: &[Mailbox],
    attachment: Option<&AttachmentFile>,
    email: &EmailContent,
) -> Result<Message, NotifyError> {
    let mut builder = Message::builder()
        .from(from.clone())
        .subject(email.subject.clone());
    for recipient in recipients {
        builder = builder.to(recipient.clone());
    }

    let mut body = MultiPart::mixed().singlepart(SinglePart::plain(email.body.clone()));
    if let Some(file) = attachment {
        body = body.singlepart(
            Attachment::new(file.filename.clone())
                .body(file.content.clone(), file.content_type.clone()),
        );
    }

    Ok(builder.multipart(body)?)
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
    attachment: Option<AttachmentFile>,
}

impl SmtpNotifier {
    pub async fn new(
        config: &NotifyConfig,
        credentials: SmtpCredentials,
    ) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&credentials.username)?;
        let recipients = config
            .active_recipients()
            .into_iter()
            .map(parse_mailbox)
            .collect::<Result<Vec<_>, _>>()?;

        let attachment = match &config.attachment {
            Some(path) => Some(AttachmentFile::load(path).await?),
            None => None,
        };

        let smtp = &config.smtp;
        let builder = match smtp.tls {
            TlsMode::Wrapper => AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?,
            TlsMode::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
            }
            TlsMode::Plain => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host),
        };

        let transport = builder
            .port(smtp.port)
            .timeout(Some(smtp.timeout()))
            .credentials(Credentials::new(credentials.username, credentials.password))
            .build();

        info!(
            host = %smtp.host,
            port = smtp.port,
            recipients = recipients.len(),
            "SMTP notifier ready"
        );

        Ok(Self {
            transport,
            from,
            recipients,
            attachment,
        })
    }

    /// Read credentials from the configured environment variables.
    pub async fn from_env(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let credentials = SmtpCredentials::from_env(&config.smtp)?;
        Self::new(config, credentials).await
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, email: &EmailContent) -> Result<(), NotifyError> {
        let message = compose_message(
            &self.from,
            &self.recipients,
            self.attachment.as_ref(),
            email,
        )?;

        let response = self.transport.send(message).await?;
        debug!(code = %response.code(), "SMTP server accepted message");

        info!(
            "Email sent successfully to {} ({})",
            self.recipients
                .iter()
                .map(|m| m.email.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            email.subject,
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
