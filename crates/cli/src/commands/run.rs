//! `run` command implementation.

use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{info, warn};

use contracts::{ErrorValue, FileSinkConfig, FunnelConfig};
use funnel::{Funnel, MetricsSnapshot, ProcessGuard};
use observability::{ErrorMetricsAggregator, MetricsSummary};

use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_funnel(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    apply_overrides(&mut config, args);

    if args.metrics_port != 0 {
        observability::init_metrics(args.metrics_port)?;
    }

    let funnel = Funnel::from_config(&config).context("Failed to build funnel")?;
    if args.install_guard {
        ProcessGuard::install(&funnel)?;
    }

    info!(
        title = ?config.title,
        listeners = funnel.listener_count("error"),
        command = ?args.command,
        "Funnel ready"
    );

    let pump = async {
        if args.command.is_empty() {
            pump_lines(&funnel, tokio::io::stdin()).await
        } else {
            run_command(&funnel, &args.command).await
        }
    };

    let raised = tokio::select! {
        result = pump => {
            let raised = result?;
            info!(raised, "Input exhausted");
            raised
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, draining sinks...");
            0
        }
    };

    let sinks = funnel.shutdown().await;
    info!(summary = %summarize(raised, &sinks), "Run summary");

    info!("Sluice finished");
    Ok(())
}

fn apply_overrides(config: &mut FunnelConfig, args: &RunArgs) {
    if let Some(ref title) = args.title {
        info!(title = %title, "Overriding title from CLI");
        config.title = Some(title.clone());
    }
    if let Some(ref path) = args.log {
        info!(path = %path.display(), "Overriding log path from CLI");
        config.log = Some(FileSinkConfig { path: path.clone() });
    }
    if let Some(level) = args.backlog_warning {
        config.backlog_warning = level;
    }
    if args.no_trace {
        config.trace = false;
    }
}

/// Raise every non-empty line read from `reader`; returns how many were raised
async fn pump_lines<R>(funnel: &Funnel, reader: R) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut raised = 0;

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        funnel.raise(line);
        raised += 1;
    }

    Ok(raised)
}

/// Spawn `command`, raising each stderr line and a failing exit status
async fn run_command(funnel: &Funnel, command: &[String]) -> Result<u64> {
    let display = command.join(" ");
    let (program, rest) = command
        .split_first()
        .ok_or_else(|| CliError::command_spawn(&display, "empty command"))?;

    let mut child = tokio::process::Command::new(program)
        .args(rest)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| CliError::command_spawn(&display, e.to_string()))?;

    let mut raised = match child.stderr.take() {
        Some(stderr) => pump_lines(funnel, stderr).await?,
        None => 0,
    };

    let status = child.wait().await.context("Failed to wait for command")?;
    if !status.success() {
        let error = CliError::command_failed(&display, status.to_string());
        funnel.raise(ErrorValue::from_error(&error));
        raised += 1;
    }

    Ok(raised)
}

fn summarize(raised: u64, sinks: &[(String, MetricsSnapshot)]) -> MetricsSummary {
    let mut aggregator = ErrorMetricsAggregator::new();
    aggregator.on_raised("error", raised);
    for (name, snapshot) in sinks {
        aggregator.on_sink_writes(name, snapshot.write_count, snapshot.failure_count);
        aggregator.on_sink_dropped(name, snapshot.dropped_count);
    }
    aggregator.summary()
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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
}
