// src/notify/notifier.rs
use crate::report::EmailContent;
use crate::retry::{RetryDecision, Retryable};
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("environment variable {0} is not set")]
    MissingCredential(String),

    #[error("invalid email address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("failed to write dry-run email: {0}")]
    Output(#[source] io::Error),
}

impl Retryable for NotifyError {
    fn retry_decision(&self) -> RetryDecision {
        match self {
            // Rejected credentials or recipients will not improve on retry.
            NotifyError::Transport(e) if e.is_permanent() => RetryDecision::NoRetry,
            NotifyError::Transport(_) => RetryDecision::Retry,
            _ => RetryDecision::NoRetry,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &EmailContent) -> Result<(), NotifyError>;

    fn name(&self) -> &'static str;
}

/// Writes emails out instead of sending them. Goes to stderr by default,
/// stdout carries the cycle report.
pub struct LogNotifier<W = io::Stderr> {
    out: Mutex<W>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::with_writer(io::stderr())
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> LogNotifier<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<W: Write + Send> Notifier for LogNotifier<W> {
    async fn send(&self, email: &EmailContent) -> Result<(), NotifyError> {
        info!(subject = %email.subject, "Dry run, email not sent");

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "--- {} ---\n{}", email.subject, email.body)
            .and_then(|_| out.flush())
            .map_err(NotifyError::Output)
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
