// src/check/mod.rs
mod checker;
mod status;

pub use checker::{CheckError, SiteChecker};
pub use status::{classify_status, CheckRecord, SiteStatus};
