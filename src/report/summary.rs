// src/report/summary.rs
use crate::check::{CheckRecord, SiteStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Everything that happened during one check cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub records: Vec<CheckRecord>,
    pub up: usize,
    pub down: usize,
    pub error: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

impl CycleSummary {
    pub fn new(cycle_id: Uuid, started_at: DateTime<Utc>, records: Vec<CheckRecord>) -> Self {
        let count = |status: SiteStatus| records.iter().filter(|r| r.status == status).count();
        let (up, down, error) = (
            count(SiteStatus::Up),
            count(SiteStatus::Down),
            count(SiteStatus::Error),
        );

        Self {
            cycle_id,
            started_at,
            finished_at: Utc::now(),
            records,
            up,
            down,
            error,
            notifications_sent: 0,
            notifications_failed: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn all_up(&self) -> bool {
        self.up == self.total()
    }
}

pub fn summary_line(summary: &CycleSummary) -> String {
    format!(
        "{} sites checked: {} up, {} down, {} error",
        summary.total(),
        summary.up,
        summary.down,
        summary.error,
    )
}
