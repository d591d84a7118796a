//! txmonitord daemon entry point.
//!
//! Initializes logging, connects the Redis-backed interfaces, and runs the
//! monitor event loop until the process is terminated.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sonic_txmon_common::redis_backend::{RedisConfig, RedisDb, RedisTable};
use sonic_txmonitord::config::{DEFAULT_POLLING_PERIOD_SECS, DEFAULT_THRESHOLD};
use sonic_txmonitord::redis_adapter::{
    spawn_config_poller, RedisCounterSource, RedisPortsProvider, RedisTableWriter,
};
use sonic_txmonitord::tables::{CFG_TX_MONITOR_TABLE_NAME, STATE_TX_ERRORS_TABLE_NAME};
use sonic_txmonitord::{MonitorConfig, MonitorDaemon, TxMonitor};

/// Capacity of the configuration event channel.
const CONFIG_EVENT_QUEUE: usize = 64;

/// SONiC TX error monitor daemon
#[derive(Parser, Debug)]
#[command(name = "txmonitord")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Redis server host
    #[arg(long, default_value = "127.0.0.1")]
    redis_host: String,

    /// Redis server port
    #[arg(long, default_value = "6379")]
    redis_port: u16,

    /// Maximum tolerated TX error delta per polling interval
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: u64,

    /// Polling period in seconds
    #[arg(long, default_value_t = DEFAULT_POLLING_PERIOD_SECS,
          value_parser = clap::value_parser!(u32).range(1..))]
    polling_period: u32,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let counters =
        Arc::new(RedisCounterSource::connect(&args.redis_host, args.redis_port).await?);
    let ports = Arc::new(RedisPortsProvider::connect(&args.redis_host, args.redis_port).await?);
    let status_table = RedisTableWriter::connect(
        &args.redis_host,
        args.redis_port,
        RedisDb::StateDb,
        STATE_TX_ERRORS_TABLE_NAME,
    )
    .await?;
    let cfg_table = RedisTableWriter::connect(
        &args.redis_host,
        args.redis_port,
        RedisDb::ConfigDb,
        CFG_TX_MONITOR_TABLE_NAME,
    )
    .await?;

    let config = MonitorConfig::new(args.threshold, args.polling_period);
    let mut monitor = TxMonitor::new(
        config,
        counters,
        ports,
        Box::new(status_table),
        Box::new(cfg_table),
    );
    monitor.init_cfg_table().await?;

    let cfg_events = RedisTable::new(
        RedisConfig::new(&args.redis_host, args.redis_port, RedisDb::ConfigDb),
        CFG_TX_MONITOR_TABLE_NAME,
    )
    .await?;
    let (events_tx, events_rx) = mpsc::channel(CONFIG_EVENT_QUEUE);
    let poller = spawn_config_poller(cfg_events, events_tx);

    let mut daemon = MonitorDaemon::new(monitor, events_rx);

    tokio::select! {
        _ = daemon.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down");
        }
    }

    poller.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("--- Starting txmonitord (Rust) ---");

    match run(args).await {
        Ok(()) => {
            info!("txmonitord exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("txmonitord error: {}", e);
            ExitCode::FAILURE
        }
    }
}
