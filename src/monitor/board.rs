// src/monitor/board.rs
use crate::check::{CheckRecord, SiteStatus};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SiteState {
    pub status: SiteStatus,
    pub consecutive_failures: usize,
    pub consecutive_successes: usize,
    pub last_checked: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: Option<SiteStatus>,
    pub current: SiteStatus,
}

impl Transition {
    /// A first observation only counts as a change when the site is not up.
    pub fn changed(&self) -> bool {
        match self.previous {
            None => !self.current.is_up(),
            Some(previous) => previous != self.current,
        }
    }
}

/// Last known state of every site, keyed by URL.
#[derive(Debug, Default)]
pub struct StatusBoard {
    sites: DashMap<String, SiteState>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: &CheckRecord) -> Transition {
        let mut entry = self
            .sites
            .entry(record.url.clone())
            .or_insert_with(|| SiteState {
                status: record.status,
                consecutive_failures: 0,
                consecutive_successes: 0,
                last_checked: record.checked_at,
            });
        let is_new = entry.consecutive_failures == 0 && entry.consecutive_successes == 0;
        let previous = if is_new { None } else { Some(entry.status) };

        let state = entry.value_mut();
        if record.is_up() {
            state.consecutive_failures = 0;
            state.consecutive_successes += 1;
        } else {
            state.consecutive_successes = 0;
            state.consecutive_failures += 1;
        }
        state.status = record.status;
        state.last_checked = record.checked_at;

        let transition = Transition {
            previous,
            current: record.status,
        };

        if let Some(previous) = previous {
            if previous != record.status {
                if record.is_up() {
                    info!("Site {} recovered (was {})", record.url, previous);
                } else {
                    warn!(
                        "Site {} is now {} after {} consecutive failures: {}",
                        record.url,
                        record.status,
                        state.consecutive_failures,
                        record.error.as_deref().unwrap_or("unknown error"),
                    );
                }
            }
        }

        transition
    }

    pub fn get(&self, url: &str) -> Option<SiteState> {
        self.sites.get(url).map(|s| s.value().clone())
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
