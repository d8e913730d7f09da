// src/check/status.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    /// Responded with HTTP 200.
    Up,
    /// Responded with any other status code.
    Down,
    /// No response (DNS, connect, TLS, timeout, ...).
    Error,
}

impl SiteStatus {
    pub fn is_up(self) -> bool {
        self == SiteStatus::Up
    }

    /// Short lowercase label, used for metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            SiteStatus::Up => "up",
            SiteStatus::Down => "down",
            SiteStatus::Error => "error",
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteStatus::Up => write!(f, "Up and Running"),
            SiteStatus::Down => write!(f, "Down"),
            SiteStatus::Error => write!(f, "Error"),
        }
    }
}

/// Outcome of checking one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub url: String,
    pub status: SiteStatus,
    pub error: Option<String>,
    pub status_code: Option<u16>,
    pub response_time_ms: u64,
    pub checked_at: DateTime<Utc>,
}

impl CheckRecord {
    pub fn is_up(&self) -> bool {
        self.status.is_up()
    }

    /// Record for a request that never produced a response.
    pub fn failed(url: impl Into<String>, error: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            url: url.into(),
            status: SiteStatus::Error,
            error: Some(error.into()),
            status_code: None,
            response_time_ms,
            checked_at: Utc::now(),
        }
    }
}

/// Classify a received status code. Only 200 counts as up.
pub fn classify_status(url: impl Into<String>, code: u16, response_time_ms: u64) -> CheckRecord {
    let (status, error) = if code == 200 {
        (SiteStatus::Up, None)
    } else {
        (SiteStatus::Down, Some(down_message(code)))
    };

    CheckRecord {
        url: url.into(),
        status,
        error,
        status_code: Some(code),
        response_time_ms,
        checked_at: Utc::now(),
    }
}

fn down_message(code: u16) -> String {
    let mut message = format!("Error (status code: {})", code);
    match code {
        404 => message.push_str(" - Page not found (404)"),
        500 => message.push_str(" - Internal server error (500)"),
        502 => message.push_str(" - Bad gateway (502)"),
        _ => {}
    }
    message
}
