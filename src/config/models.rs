// src/config/models.rs
use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one site must be configured")]
    NoSites,

    #[error("site {0:?} is not a valid URL")]
    InvalidUrl(String),

    #[error("site {0} must use http or https")]
    UnsupportedScheme(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("notifications are enabled but no recipients are configured")]
    NoRecipients,

    #[error("invalid recipient address {0:?}")]
    InvalidRecipient(String),

    #[error("smtp host must not be empty")]
    EmptySmtpHost,

    #[error("server path {0:?} must start with '/'")]
    InvalidServerPath(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sites as written in the config file. Reports repeat this text verbatim.
    pub sites: Vec<String>,
    #[serde(default)]
    pub check: CheckConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Build a config for the given sites with every section at its default.
    pub fn with_sites<I>(sites: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            sites: sites.into_iter().map(Into::into).collect(),
            check: CheckConfig::default(),
            notify: NotifyConfig::default(),
            retry: RetryConfig::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sites.is_empty() {
            return Err(ConfigError::NoSites);
        }
        for site in &self.sites {
            let url = Url::parse(site).map_err(|_| ConfigError::InvalidUrl(site.clone()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::UnsupportedScheme(site.clone()));
            }
        }

        if self.check.timeout_secs == 0 {
            return Err(ConfigError::Zero("check.timeout_secs"));
        }
        if self.check.interval_secs == Some(0) {
            return Err(ConfigError::Zero("check.interval_secs"));
        }
        if self.check.concurrency == 0 {
            return Err(ConfigError::Zero("check.concurrency"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Zero("retry.max_attempts"));
        }

        if self.notify.enabled {
            let recipients = self.notify.active_recipients();
            if recipients.is_empty() {
                return Err(ConfigError::NoRecipients);
            }
            if let Some(bad) = recipients.iter().find(|r| r.parse::<Mailbox>().is_err()) {
                return Err(ConfigError::InvalidRecipient(bad.to_string()));
            }
            if self.notify.smtp.host.trim().is_empty() {
                return Err(ConfigError::EmptySmtpHost);
            }
        }

        for path in [&self.server.metrics_path, &self.server.status_path] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidServerPath(path.clone()));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    #[serde(default = "default_check_timeout")]
    pub timeout_secs: u64,
    /// Delay between cycles. `None` runs a single cycle.
    #[serde(default)]
    pub interval_secs: Option<u64>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl CheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval_secs.map(Duration::from_secs)
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_check_timeout(),
            interval_secs: None,
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyMode {
    /// One email per selected site.
    PerSite,
    /// One report email covering every site.
    Batched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    Always,
    OnFailure,
    OnChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_mode")]
    pub mode: NotifyMode,
    #[serde(default = "default_policy")]
    pub policy: NotifyPolicy,
    #[serde(default)]
    pub recipients: Vec<String>,
    /// Static file attached to every email.
    #[serde(default)]
    pub attachment: Option<PathBuf>,
    #[serde(default = "default_signature")]
    pub signature: String,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl NotifyConfig {
    /// Recipients with blank entries dropped.
    pub fn active_recipients(&self) -> Vec<&str> {
        self.recipients
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect()
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: default_mode(),
            policy: default_policy(),
            recipients: Vec::new(),
            attachment: None,
            signature: default_signature(),
            smtp: SmtpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Implicit TLS (SMTPS, usually port 465).
    Wrapper,
    #[serde(rename = "starttls")]
    StartTls,
    /// Unencrypted, for local relays.
    #[serde(rename = "none")]
    Plain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default = "default_tls")]
    pub tls: TlsMode,
    /// Environment variable holding the login, also used as the sender address.
    #[serde(default = "default_username_env")]
    pub username_env: String,
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(default = "default_smtp_timeout")]
    pub timeout_secs: u64,
}

impl SmtpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            tls: default_tls(),
            username_env: default_username_env(),
            password_env: default_password_env(),
            timeout_secs: default_smtp_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,
}

impl RetryConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base(),
            backoff_max_ms: default_backoff_max(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    #[serde(default = "default_status_path")]
    pub status_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: default_bind(),
            port: default_server_port(),
            metrics_path: default_metrics_path(),
            status_path: default_status_path(),
        }
    }
}

fn default_check_timeout() -> u64 {
    10
}

fn default_concurrency() -> usize {
    1
}

fn default_mode() -> NotifyMode {
    NotifyMode::Batched
}

fn default_policy() -> NotifyPolicy {
    NotifyPolicy::Always
}

fn default_signature() -> String {
    "IT Department".to_string()
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_tls() -> TlsMode {
    TlsMode::Wrapper
}

fn default_username_env() -> String {
    "User_Email".to_string()
}

fn default_password_env() -> String {
    "User_Passwd".to_string()
}

fn default_smtp_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    1
}

fn default_backoff_base() -> u64 {
    500
}

fn default_backoff_max() -> u64 {
    10_000
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    9090
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_status_path() -> String {
    "/status".to_string()
}
