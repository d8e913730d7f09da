// src/report/mod.rs
mod format;
mod summary;

pub use format::{batch_email, console_line, site_email, status_report, EmailContent};
pub use summary::{summary_line, CycleSummary};
