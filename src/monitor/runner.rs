// src/monitor/runner.rs
use super::board::{StatusBoard, Transition};
use crate::check::{CheckError, CheckRecord, SiteChecker};
use crate::config::{Config, NotifyMode, NotifyPolicy};
use crate::metrics::MetricsCollector;
use crate::notify::Notifier;
use crate::report::{self, CycleSummary, EmailContent};
use crate::retry::RetryStrategy;
use arc_swap::ArcSwapOption;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// How each cycle is written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Console,
    Json,
    Quiet,
}

pub struct Monitor {
    config: Config,
    checker: SiteChecker,
    notifier: Option<Arc<dyn Notifier>>,
    retry: RetryStrategy,
    board: StatusBoard,
    latest: Arc<ArcSwapOption<CycleSummary>>,
    cycles: AtomicU64,
    metrics: Option<Arc<MetricsCollector>>,
    output: OutputFormat,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Monitor {
    pub fn new(
        config: Config,
        notifier: Option<Arc<dyn Notifier>>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Result<Self, CheckError> {
        let checker = SiteChecker::new(&config.check, metrics.clone())?;
        let retry = RetryStrategy::new(config.retry.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            checker,
            notifier,
            retry,
            board: StatusBoard::new(),
            latest: Arc::new(ArcSwapOption::empty()),
            cycles: AtomicU64::new(0),
            metrics,
            output: OutputFormat::Console,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    /// Most recent completed cycle.
    pub fn latest(&self) -> Option<Arc<CycleSummary>> {
        self.latest.load_full()
    }

    /// Shared handle to the most recent cycle, for the status server.
    pub fn latest_handle(&self) -> Arc<ArcSwapOption<CycleSummary>> {
        self.latest.clone()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Run a single cycle, or loop with the configured delay until shutdown.
    pub async fn run(&self) {
        let Some(interval) = self.config.check.interval() else {
            self.run_once().await;
            return;
        };

        let mut shutdown_rx = self.shutdown_rx.clone();
        info!(
            "Starting monitor for {} sites with interval: {:?}",
            self.config.sites.len(),
            interval
        );

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            self.run_once().await;

            tokio::select! {
                _ = sleep(interval) => {}
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Monitor shutting down");
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn run_once(&self) -> CycleSummary {
        let cycle_id = Uuid::new_v4();
        self.cycle(cycle_id)
            .instrument(info_span!("cycle", %cycle_id))
            .await
    }

    async fn cycle(&self, cycle_id: Uuid) -> CycleSummary {
        let started_at = Utc::now();
        let records = self.checker.check_all(&self.config.sites).await;

        let mut selected = Vec::new();
        for (idx, record) in records.iter().enumerate() {
            let transition = self.board.record(record);
            if self.selects(record, &transition) {
                selected.push(idx);
            }
        }

        let mut summary = CycleSummary::new(cycle_id, started_at, records);

        if let Some(metrics) = &self.metrics {
            metrics.record_cycle(summary.up, summary.total());
        }

        if self.output == OutputFormat::Console {
            for record in &summary.records {
                println!("{}", report::console_line(record));
            }
        }

        let (sent, failed) = self.dispatch(&summary.records, &selected).await;
        summary.notifications_sent = sent;
        summary.notifications_failed = failed;
        summary.finished_at = Utc::now();

        info!("{}", report::summary_line(&summary));

        if self.output == OutputFormat::Json {
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(e) => warn!("Failed to serialize cycle summary: {}", e),
            }
        }

        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.latest.store(Some(Arc::new(summary.clone())));
        summary
    }

    fn selects(&self, record: &CheckRecord, transition: &Transition) -> bool {
        match self.config.notify.policy {
            NotifyPolicy::Always => true,
            NotifyPolicy::OnFailure => !record.is_up(),
            NotifyPolicy::OnChange => transition.changed(),
        }
    }

    /// Send notifications for the selected records. Returns (sent, failed).
    async fn dispatch(&self, records: &[CheckRecord], selected: &[usize]) -> (usize, usize) {
        let Some(notifier) = &self.notifier else {
            return (0, 0);
        };
        if selected.is_empty() {
            debug!("Nothing to notify");
            return (0, 0);
        }

        let signature = &self.config.notify.signature;
        let emails: Vec<EmailContent> = match self.config.notify.mode {
            NotifyMode::PerSite => selected
                .iter()
                .map(|&idx| report::site_email(&records[idx], signature))
                .collect(),
            NotifyMode::Batched => vec![report::batch_email(records, signature)],
        };

        let (mut sent, mut failed) = (0, 0);
        for email in &emails {
            if self.deliver(notifier.as_ref(), email).await {
                sent += 1;
            } else {
                failed += 1;
            }
        }
        (sent, failed)
    }

    async fn deliver(&self, notifier: &dyn Notifier, email: &EmailContent) -> bool {
        let result = self.retry.execute(|| notifier.send(email)).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_notification(result.is_ok());
        }

        match result {
            Ok(()) => true,
            Err(e) => {
                error!(
                    notifier = notifier.name(),
                    subject = %email.subject,
                    "Failed to send notification: {}",
                    e
                );
                false
            }
        }
    }
}
