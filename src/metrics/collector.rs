// src/metrics/collector.rs
use crate::check::{CheckRecord, SiteStatus};
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    /// Encode every registered metric in the Prometheus text format.
    pub fn gather(&self) -> Result<Vec<u8>, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    // Check metrics
    pub checks_total: IntCounterVec,
    pub check_duration_seconds: HistogramVec,
    pub site_up: IntGaugeVec,

    // Cycle metrics
    pub cycles_total: IntCounter,
    pub sites_up: IntGauge,
    pub sites_total: IntGauge,

    // Notification metrics
    pub notifications_total: IntCounterVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let checks_total = IntCounterVec::new(
            Opts::new("site_monitor_checks_total", "Total number of site checks"),
            &["site", "status"],
        )?;
        registry.register(Box::new(checks_total.clone()))?;

        let check_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "site_monitor_check_duration_seconds",
                "Site check duration in seconds",
            ),
            &["site"],
        )?;
        registry.register(Box::new(check_duration_seconds.clone()))?;

        let site_up = IntGaugeVec::new(
            Opts::new("site_monitor_site_up", "Site status (1=up, 0=down or error)"),
            &["site"],
        )?;
        registry.register(Box::new(site_up.clone()))?;

        let cycles_total =
            IntCounter::new("site_monitor_cycles_total", "Total number of check cycles")?;
        registry.register(Box::new(cycles_total.clone()))?;

        let sites_up = IntGauge::new("site_monitor_sites_up", "Number of sites up")?;
        registry.register(Box::new(sites_up.clone()))?;

        let sites_total =
            IntGauge::new("site_monitor_sites_total", "Total number of monitored sites")?;
        registry.register(Box::new(sites_total.clone()))?;

        let notifications_total = IntCounterVec::new(
            Opts::new(
                "site_monitor_notifications_total",
                "Total notifications by delivery result",
            ),
            &["result"],
        )?;
        registry.register(Box::new(notifications_total.clone()))?;

        Ok(Self {
            checks_total,
            check_duration_seconds,
            site_up,
            cycles_total,
            sites_up,
            sites_total,
            notifications_total,
        })
    }

    pub fn record_check(&self, record: &CheckRecord) {
        self.checks_total
            .with_label_values(&[record.url.as_str(), record.status.as_str()])
            .inc();

        self.check_duration_seconds
            .with_label_values(&[record.url.as_str()])
            .observe(record.response_time_ms as f64 / 1000.0);

        let value = if record.status == SiteStatus::Up { 1 } else { 0 };
        self.site_up.with_label_values(&[record.url.as_str()]).set(value);
    }

    pub fn record_cycle(&self, up: usize, total: usize) {
        self.cycles_total.inc();
        self.sites_up.set(up as i64);
        self.sites_total.set(total as i64);
    }

    pub fn record_notification(&self, success: bool) {
        let result = if success { "success" } else { "failure" };
        self.notifications_total.with_label_values(&[result]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::classify_status;

    #[test]
    fn test_gather_contains_recorded_values() {
        let registry = MetricsRegistry::new().unwrap();
        let metrics = registry.collector();

        metrics.record_check(&classify_status("https://example.com", 502, 40));
        metrics.record_cycle(0, 1);
        metrics.record_notification(false);

        let text = String::from_utf8(registry.gather().unwrap()).unwrap();
        assert!(text.contains("site_monitor_site_up{site=\"https://example.com\"} 0"));
        assert!(text.contains("site_monitor_sites_total 1"));
        assert!(text.contains("site_monitor_cycles_total 1"));
        assert!(text.contains("site_monitor_notifications_total{result=\"failure\"} 1"));
    }
}
