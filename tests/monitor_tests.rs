// tests/monitor_tests.rs
use async_trait::async_trait;
use site_monitor::check::SiteStatus;
use site_monitor::config::{Config, NotifyMode, NotifyPolicy, RetryConfig};
use site_monitor::metrics::MetricsRegistry;
use site_monitor::monitor::{Monitor, OutputFormat};
use site_monitor::notify::{Notifier, NotifyError};
use site_monitor::report::EmailContent;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<EmailContent>>,
}

impl RecordingNotifier {
    fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.subject.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, email: &EmailContent) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Fails every attempt with a configuration-style error.
#[derive(Default)]
struct FailingNotifier {
    attempts: AtomicUsize,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _email: &EmailContent) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::MissingCredential("User_Passwd".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

async fn sites(server: &mut mockito::Server, statuses: &[(&str, usize)]) -> Vec<String> {
    let mut urls = Vec::new();
    for (path, status) in statuses {
        server
            .mock("GET", *path)
            .with_status(*status)
            .create_async()
            .await;
        urls.push(format!("{}{}", server.url(), path));
    }
    urls
}

fn config(sites: Vec<String>, mode: NotifyMode, policy: NotifyPolicy) -> Config {
    let mut config = Config::with_sites(sites);
    config.check.timeout_secs = 5;
    config.notify.enabled = true;
    config.notify.mode = mode;
    config.notify.policy = policy;
    config.notify.recipients = vec!["ops@example.com".to_string()];
    config.notify.signature = "Ops".to_string();
    config
}

fn monitor(config: Config, notifier: Arc<dyn Notifier>) -> Monitor {
    Monitor::new(config, Some(notifier), None)
        .unwrap()
        .with_output(OutputFormat::Quiet)
}

#[tokio::test]
async fn test_per_site_always_sends_one_email_per_site() {
    let mut server = mockito::Server::new_async().await;
    let urls = sites(&mut server, &[("/a", 200), ("/b", 404), ("/c", 200)]).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = monitor(
        config(urls.clone(), NotifyMode::PerSite, NotifyPolicy::Always),
        notifier.clone(),
    );

    let summary = monitor.run_once().await;

    assert_eq!((summary.up, summary.down, summary.error), (2, 1, 0));
    assert_eq!(summary.notifications_sent, 3);
    assert_eq!(
        notifier.subjects(),
        urls.iter()
            .map(|u| format!("Website Status Report: {}", u))
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_per_site_on_failure_skips_up_sites() {
    let mut server = mockito::Server::new_async().await;
    let urls = sites(&mut server, &[("/a", 200), ("/b", 502)]).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = monitor(
        config(urls.clone(), NotifyMode::PerSite, NotifyPolicy::OnFailure),
        notifier.clone(),
    );

    monitor.run_once().await;

    let sent = notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, format!("Website Status Report: {}", urls[1]));
    assert!(sent[0].body.contains("Bad gateway (502)"));
}

#[tokio::test]
async fn test_batched_sends_single_report() {
    let mut server = mockito::Server::new_async().await;
    let urls = sites(&mut server, &[("/a", 200), ("/b", 500), ("/c", 200)]).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = monitor(
        config(urls.clone(), NotifyMode::Batched, NotifyPolicy::Always),
        notifier.clone(),
    );

    let summary = monitor.run_once().await;

    assert_eq!(summary.notifications_sent, 1);
    let sent = notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Website Monitoring Report");
    for url in &urls {
        assert!(sent[0].body.contains(url.as_str()));
    }
    assert!(sent[0].body.contains("Internal server error (500)"));
}

#[tokio::test]
async fn test_on_failure_sends_nothing_when_all_up() {
    let mut server = mockito::Server::new_async().await;
    let urls = sites(&mut server, &[("/a", 200), ("/b", 200)]).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = monitor(
        config(urls, NotifyMode::Batched, NotifyPolicy::OnFailure),
        notifier.clone(),
    );

    let summary = monitor.run_once().await;

    assert!(summary.all_up());
    assert_eq!(summary.notifications_sent, 0);
    assert!(notifier.subjects().is_empty());
}

#[tokio::test]
async fn test_on_change_only_notifies_transitions() {
    let mut server = mockito::Server::new_async().await;
    let up = server
        .mock("GET", "/flaky")
        .with_status(200)
        .expect(2)
        .create_async()
        .await;
    let url = format!("{}/flaky", server.url());

    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = monitor(
        config(vec![url.clone()], NotifyMode::PerSite, NotifyPolicy::OnChange),
        notifier.clone(),
    );

    // First observation is up: no change.
    monitor.run_once().await;
    // Still up: no change.
    monitor.run_once().await;
    assert!(notifier.subjects().is_empty());
    up.assert_async().await;
    up.remove_async().await;

    server
        .mock("GET", "/flaky")
        .with_status(503)
        .create_async()
        .await;

    // Up -> Down triggers a notification, Down -> Down does not.
    monitor.run_once().await;
    monitor.run_once().await;

    assert_eq!(notifier.subjects().len(), 1);
    assert_eq!(
        monitor.board().get(url.as_str()).unwrap().consecutive_failures,
        2
    );
}

#[tokio::test]
async fn test_unreachable_site_is_error() {
    let url = "http://127.0.0.1:1/".to_string();
    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = monitor(
        config(vec![url], NotifyMode::Batched, NotifyPolicy::OnFailure),
        notifier.clone(),
    );

    let summary = monitor.run_once().await;

    assert_eq!(summary.records[0].status, SiteStatus::Error);
    assert!(summary.records[0].error.is_some());
    let sent = notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("Error details:"));
}

#[tokio::test]
async fn test_reports_use_configured_url_text() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/").with_status(500).create_async().await;
    // Bare host, no trailing slash.
    let site = server.url();

    let notifier = Arc::new(RecordingNotifier::default());
    let registry = MetricsRegistry::new().unwrap();
    let monitor = Monitor::new(
        config(vec![site.clone()], NotifyMode::PerSite, NotifyPolicy::Always),
        Some(notifier.clone()),
        Some(registry.collector()),
    )
    .unwrap()
    .with_output(OutputFormat::Quiet);

    let summary = monitor.run_once().await;

    assert_eq!(summary.records[0].url, site);
    assert_eq!(
        notifier.subjects(),
        vec![format!("Website Status Report: {}", site)]
    );
    assert!(monitor.board().get(&site).is_some());

    let text = String::from_utf8(registry.gather().unwrap()).unwrap();
    assert!(text.contains(&format!("site_monitor_site_up{{site=\"{}\"}} 0", site)));
}

#[tokio::test]
async fn test_failed_notification_is_counted_not_fatal() {
    let mut server = mockito::Server::new_async().await;
    let urls = sites(&mut server, &[("/a", 500), ("/b", 404)]).await;

    let mut config = config(urls, NotifyMode::PerSite, NotifyPolicy::Always);
    config.retry = RetryConfig {
        max_attempts: 3,
        backoff_base_ms: 1,
        backoff_max_ms: 5,
    };

    let notifier = Arc::new(FailingNotifier::default());
    let registry = MetricsRegistry::new().unwrap();
    let monitor = Monitor::new(config, Some(notifier.clone()), Some(registry.collector()))
        .unwrap()
        .with_output(OutputFormat::Quiet);

    let summary = monitor.run_once().await;

    assert_eq!(summary.notifications_sent, 0);
    assert_eq!(summary.notifications_failed, 2);
    // Credential errors are not retried.
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 2);

    let text = String::from_utf8(registry.gather().unwrap()).unwrap();
    assert!(text.contains("site_monitor_notifications_total{result=\"failure\"} 2"));
}

#[tokio::test]
async fn test_without_notifier_only_checks() {
    let mut server = mockito::Server::new_async().await;
    let urls = sites(&mut server, &[("/a", 404)]).await;

    let monitor = Monitor::new(Config::with_sites(urls), None, None)
        .unwrap()
        .with_output(OutputFormat::Quiet);

    let summary = monitor.run_once().await;

    assert_eq!(summary.down, 1);
    assert_eq!(summary.notifications_sent + summary.notifications_failed, 0);
    assert_eq!(monitor.latest().unwrap().cycle_id, summary.cycle_id);
}

#[tokio::test]
async fn test_polling_loop_stops_on_shutdown() {
    let mut server = mockito::Server::new_async().await;
    let urls = sites(&mut server, &[("/a", 200)]).await;

    let mut config = Config::with_sites(urls);
    config.check.interval_secs = Some(1);

    let monitor = Arc::new(
        Monitor::new(config, None, None)
            .unwrap()
            .with_output(OutputFormat::Quiet),
    );

    let runner = monitor.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(1500)).await;
    monitor.shutdown();

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("monitor did not stop")
        .unwrap();

    assert!(monitor.cycles_completed() >= 2);
}

#[tokio::test]
async fn test_one_shot_run_returns_after_single_cycle() {
    let mut server = mockito::Server::new_async().await;
    let urls = sites(&mut server, &[("/a", 200)]).await;

    let monitor = Monitor::new(Config::with_sites(urls), None, None)
        .unwrap()
        .with_output(OutputFormat::Quiet);

    tokio::time::timeout(Duration::from_secs(5), monitor.run())
        .await
        .expect("one-shot run should not loop");

    assert_eq!(monitor.cycles_completed(), 1);
}
