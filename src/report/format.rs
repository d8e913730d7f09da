// src/report/format.rs
use crate::check::{CheckRecord, SiteStatus};
use serde::Serialize;
use std::fmt::Write;

/// Subject and plaintext body of one notification email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

pub fn console_line(record: &CheckRecord) -> String {
    match record.status {
        SiteStatus::Up => format!("{} is working perfectly!", record.url),
        SiteStatus::Down => format!(
            "{} is facing some errors (status code: {}).\n\
             Try to fix it or raise a ticket for further investigation.",
            record.url,
            record
                .status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        ),
        SiteStatus::Error => format!(
            "Error accessing {}: {}",
            record.url,
            record.error.as_deref().unwrap_or("unknown error"),
        ),
    }
}

/// Bullet list of every record, with error details for the ones not up.
pub fn status_report(records: &[CheckRecord]) -> String {
    let mut report = String::new();
    for record in records {
        let _ = write!(report, "\n* {}: {}\n", record.url, record.status);
        if let (false, Some(error)) = (record.is_up(), &record.error) {
            let _ = writeln!(report, "  Error details: {}", error);
        }
    }
    report
}

pub fn site_email(record: &CheckRecord, signature: &str) -> EmailContent {
    let mut body = format!(
        "Hi Team,\n\n\
         This email provides a status update for the website: {}.\n\n\
         Current Status: {}\n\n",
        record.url, record.status,
    );

    if !record.is_up() {
        let _ = write!(
            body,
            "Error Details: {}\n\n\
             This error message can help diagnose the specific issue with the website.\n\n\
             Action Required: Please investigate and resolve the website issue.\n\n",
            record.error.as_deref().unwrap_or("none"),
        );
    }

    let _ = writeln!(body, "Thanks,\n{}", signature);

    EmailContent {
        subject: format!("Website Status Report: {}", record.url),
        body,
    }
}

pub fn batch_email(records: &[CheckRecord], signature: &str) -> EmailContent {
    let body = format!(
        "Hi Team,\n\n\
         This email provides a status report for all monitored websites:\n\n\
         {}\n\n\
         Thanks,\n{}\n",
        status_report(records),
        signature,
    );

    EmailContent {
        subject: "Website Monitoring Report".to_string(),
        body,
    }
}
