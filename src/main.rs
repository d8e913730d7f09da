// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use site_monitor::{
    cli::Cli,
    config::{self, Config},
    metrics::MetricsRegistry,
    monitor::{Monitor, OutputFormat},
    notify::{LogNotifier, Notifier, SmtpNotifier},
    server::{self, ServerBuilder, StatusHandler},
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Credentials usually live in a local .env file.
    dotenvy::dotenv().ok();

    let level = if cli.verbose {
        "site_monitor=debug"
    } else {
        "site_monitor=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(level.parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Loading configuration from: {}", cli.config.display());
    let mut config = config::load_config(&cli.config)?;
    cli.apply(&mut config);
    config.validate()?;

    if cli.print_config {
        print!("{}", config::to_yaml(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    let metrics_registry = Arc::new(MetricsRegistry::new()?);
    let notifier = build_notifier(&config, cli.dry_run).await?;
    let output = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Console
    };

    let monitor = Arc::new(
        Monitor::new(config.clone(), notifier, Some(metrics_registry.collector()))
            .context("Failed to create site checker")?
            .with_output(output),
    );

    if config.check.interval_secs.is_none() {
        if config.server.enabled {
            warn!("Status server only runs in polling mode, ignoring server.enabled");
        }

        let summary = monitor.run_once().await;
        return Ok(if summary.all_up() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    // Polling mode
    let (server_stop_tx, server_stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server_task = if config.server.enabled {
        let addr = server::socket_addr(&config.server)?;
        let handler = StatusHandler::new(
            &config.server,
            metrics_registry.clone(),
            monitor.latest_handle(),
        );

        Some(tokio::spawn(async move {
            let stopped = async {
                let _ = server_stop_rx.await;
            };
            if let Err(e) = ServerBuilder::new(addr)
                .with_handler(handler)
                .serve(stopped)
                .await
            {
                error!("Status server error: {:#}", e);
            }
        }))
    } else {
        None
    };

    let signal_monitor = monitor.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_monitor.shutdown();
    });

    monitor.run().await;

    let _ = server_stop_tx.send(());
    if let Some(task) = server_task {
        let _ = task.await;
    }

    Ok(ExitCode::SUCCESS)
}

async fn build_notifier(config: &Config, dry_run: bool) -> Result<Option<Arc<dyn Notifier>>> {
    if !config.notify.enabled {
        return Ok(None);
    }

    if dry_run {
        info!("Dry run: emails will be printed, not sent");
        return Ok(Some(Arc::new(LogNotifier::new())));
    }

    let notifier = SmtpNotifier::from_env(&config.notify)
        .await
        .context("Failed to set up email notifications")?;
    Ok(Some(Arc::new(notifier)))
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
