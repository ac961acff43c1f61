//! rmx: collect and inspect the live output of concurrent task runs.
//!
//! `rmx listen` hosts the intake listener and mirrors the currently selected
//! run to stdout; task processes connect to the advertised port and write
//! their output. `rmx config` prints the resolved configuration.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;

use runmux_core::config::{Config, LogFormat};
use runmux_core::intake::{INTAKE_PORT_ENV_VAR, IntakeServer, shared};
use runmux_core::logging::init_logging;
use runmux_core::observer::RunNotification;
use runmux_core::registry::RunRegistry;

#[derive(Parser)]
#[command(name = "rmx", version, about = "Bounded output multiplexing for concurrent task runs")]
struct Cli {
    /// Path to the config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Host the intake listener and mirror the selected run to stdout
    Listen {
        /// Bind address, e.g. 127.0.0.1:0
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Maximum number of runs retained in the history
        #[arg(long, value_name = "N")]
        max_runs: Option<usize>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(long, value_name = "LEVEL")]
        log_level: Option<String>,

        /// Log format (pretty, json)
        #[arg(long, value_name = "FORMAT")]
        log_format: Option<String>,
    },
    /// Print the resolved configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config =
        Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Listen {
            bind,
            max_runs,
            log_level,
            log_format,
        } => {
            if let Some(bind) = bind {
                config.intake.bind_addr = bind;
            }
            if let Some(max_runs) = max_runs {
                config.view.max_runs = max_runs;
            }
            if let Some(level) = log_level {
                config.log.level = level;
            }
            if let Some(format) = log_format {
                config.log.format = format
                    .parse::<LogFormat>()
                    .map_err(|e| anyhow::anyhow!(e))?;
            }
            config.validate().context("invalid configuration")?;
            init_logging(&config.log).context("failed to initialize logging")?;
            listen(&config).await
        }
        Command::Config => {
            print!("{}", config.to_toml());
            Ok(())
        }
    }
}

/// Host the intake listener until Ctrl-C, mirroring the selected run to
/// stdout. Status (selection changes, relabels) goes to the log on stderr;
/// stdout carries nothing but run output.
async fn listen(config: &Config) -> anyhow::Result<()> {
    let mut registry = RunRegistry::with_capacity(config.view.max_runs);
    registry.attach_observer(Some(Box::new(stdout_observer)));
    let registry = shared(registry);

    let server = IntakeServer::bind(&config.intake.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.intake.bind_addr))?;
    info!(
        port = server.port(),
        "Export {INTAKE_PORT_ENV_VAR}={} to task processes", server.port()
    );

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let server_handle = tokio::spawn(server.run(registry, shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("failed to wait for Ctrl-C")?;
    info!("Interrupted; shutting down");
    let _ = shutdown_tx.send(()).await;
    server_handle.await.context("intake listener panicked")?;
    Ok(())
}

/// Observer that mirrors the selected run to stdout.
fn stdout_observer(notification: RunNotification) {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match notification {
        RunNotification::Replace {
            run_id,
            contents,
            labels,
        } => {
            info!(run_id = %run_id, runs = labels.len(), "Viewing run");
            let _ = out.write_all(contents.as_bytes());
            let _ = out.flush();
        }
        RunNotification::Append { chunk, .. } => {
            let _ = out.write_all(chunk.as_bytes());
            let _ = out.flush();
        }
        RunNotification::Relabel { run_id, label } => {
            info!(run_id = %run_id, label = %label, "Run relabeled");
        }
    }
}
