//! Command-line entry point for the MCP server monitor.
//!
//! Usage:
//!
//! ```text
//! vigil run                 # sweep on a schedule until Ctrl-C
//! vigil sweep               # one sweep, report logged
//! vigil check <server-id>   # check one server, report as JSON
//! vigil uptime <server-id>  # uptime percentage and recent history
//! ```
//!
//! Settings come from `VIGIL_*` environment variables.

use clap::{Parser, Subcommand};
use eyre::{WrapErr, bail};
use mockable::DefaultClock;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use vigil::{
    config::MonitorConfig,
    monitor::{
        adapters::{
            http::HttpMcpClient,
            postgres::{PostgresMonitorStore, connect_pool},
        },
        domain::ServerId,
        services::{MonitorPorts, MonitorSweep, SweepScheduler},
    },
    telemetry,
};

type PostgresSweep = MonitorSweep<
    PostgresMonitorStore,
    HttpMcpClient,
    PostgresMonitorStore,
    PostgresMonitorStore,
    PostgresMonitorStore,
    DefaultClock,
>;

#[derive(Debug, Parser)]
#[command(name = "vigil", version)]
#[command(about = "Availability monitor and tool catalog reconciler for MCP servers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sweep every registered server on the configured interval until Ctrl-C
    Run,
    /// Run a single sweep and exit
    Sweep,
    /// Check one server now and print its report as JSON
    Check {
        /// Registered server identifier
        server_id: i64,
    },
    /// Print a server's uptime percentage and most recent snapshots
    Uptime {
        /// Registered server identifier
        server_id: i64,
        /// Number of recent snapshots to include
        #[arg(long, default_value_t = 10)]
        recent: usize,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let config = MonitorConfig::from_env()?;
    telemetry::init(config.log_json)?;

    let sweep = Arc::new(build_sweep(&config)?);
    match cli.command {
        Command::Run => run_scheduled(sweep, &config).await,
        Command::Sweep => {
            let report = sweep.run_sweep_once().await;
            let rendered = serde_json::to_string(&report)?;
            info!(sweep_id = %report.sweep_id, report = %rendered, "sweep report");
            Ok(())
        }
        Command::Check { server_id } => {
            let Some(report) = sweep.check_server(ServerId::new(server_id)).await? else {
                bail!("server {server_id} is not registered");
            };
            write_json(&report)
        }
        Command::Uptime { server_id, recent } => {
            let id = ServerId::new(server_id);
            let uptime_percent = sweep.ledger().uptime_percent(id).await?;
            let snapshots = sweep.ledger().recent_server_snapshots(id, recent).await?;
            write_json(&serde_json::json!({
                "server_id": id,
                "uptime_percent": uptime_percent,
                "recent": snapshots,
            }))
        }
    }
}

fn build_sweep(config: &MonitorConfig) -> eyre::Result<PostgresSweep> {
    let pool = connect_pool(config.require_database_url()?, config.db_pool_size)
        .wrap_err("failed to open the database pool")?;
    let store = Arc::new(PostgresMonitorStore::new(pool));
    let network = Arc::new(
        HttpMcpClient::new(config.http_settings()).wrap_err("failed to build the HTTP client")?,
    );

    Ok(MonitorSweep::new(
        MonitorPorts {
            registry: Arc::clone(&store),
            network,
            credentials: Arc::clone(&store),
            catalog: Arc::clone(&store),
            history: store,
            clock: Arc::new(DefaultClock),
        },
        config.sweep_settings(),
    ))
}

async fn run_scheduled(sweep: Arc<PostgresSweep>, config: &MonitorConfig) -> eyre::Result<()> {
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                signal_token.cancel();
            }
            Err(err) => error!(reason = %err, "failed to listen for the shutdown signal"),
        }
    });

    let scheduler = SweepScheduler::new(
        move || {
            let job = Arc::clone(&sweep);
            async move { job.run_sweep_once().await }
        },
        config.schedule_settings(),
    );
    let exit = scheduler.run(shutdown).await;

    info!(
        completed_sweeps = exit.completed_sweeps,
        abandoned_in_flight = exit.abandoned_in_flight,
        "monitor stopped"
    );
    Ok(())
}

fn write_json(value: &impl serde::Serialize) -> eyre::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}
