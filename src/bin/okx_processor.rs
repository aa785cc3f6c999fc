//! CLI entry point (A7): parses flags, builds a [`Settings`], constructs
//! the [`Engine`], installs the signal handler, spawns the fixed thread
//! set, and joins them.
//!
//! Grounded in `original_source/src/main.c`'s `main()` and the teacher's
//! `clap`-based bins.

use clap::Parser;
use okx_trade_processor::config::{Settings, DEFAULT_SYMBOLS};
use okx_trade_processor::engine::Engine;
use std::path::PathBuf;

/// Real-time trade-stream processor: sliding-window VWAP and lagged
/// cross-symbol correlation over a fixed list of spot symbols.
#[derive(Parser, Debug)]
#[command(name = "okx-processor", version, about)]
struct Cli {
    /// Tracked symbols, in OKX `instId` form (comma-separated).
    #[arg(long, env = "OKX_SYMBOLS", value_delimiter = ',', default_values_t = DEFAULT_SYMBOLS.map(str::to_string))]
    symbols: Vec<String>,

    /// Ingress ring capacity (`Q`). One slot is always reserved.
    #[arg(long, env = "OKX_RING_CAPACITY", default_value_t = Settings::default().ring_capacity)]
    ring_capacity: usize,

    /// Sliding-window capacity per symbol, in trades (`K`).
    #[arg(long, env = "OKX_WINDOW_CAPACITY", default_value_t = Settings::default().window_capacity)]
    window_capacity: usize,

    /// fsync() after every append-only write.
    #[arg(long, env = "OKX_FSYNC_PER_WRITE")]
    fsync_per_write: bool,

    /// Root directory for all output files.
    #[arg(long, env = "OKX_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Bounded retry count for the transport's reconnect/backoff policy.
    #[arg(long, env = "OKX_TRANSPORT_MAX_RETRIES", default_value_t = Settings::default().transport_max_retries)]
    transport_max_retries: u32,

    /// Log level for the `tracing` subscriber.
    #[arg(long, env = "OKX_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_settings(self) -> Settings {
        Settings {
            symbols: self.symbols,
            ring_capacity: self.ring_capacity,
            window_capacity: self.window_capacity,
            fsync_per_write: self.fsync_per_write,
            data_dir: self.data_dir,
            transport_max_retries: self.transport_max_retries,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let log_level = cli.log_level.clone();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.clone().into()),
        )
        .init();

    let settings = cli.into_settings();
    tracing::info!(symbols = ?settings.symbols, "starting okx trade processor");

    let engine = match Engine::new(settings) {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!(%err, "engine initialization failed");
            std::process::exit(1);
        }
    };

    if let Err(err) = okx_trade_processor::shutdown::install(
        engine.shutdown_flag(),
        engine.ring(),
        engine.transport_handle(),
    ) {
        tracing::error!(%err, "failed to install signal handler");
        std::process::exit(1);
    }

    let handles = match engine.spawn_threads() {
        Ok(handles) => handles,
        Err(err) => {
            tracing::error!(%err, "failed to spawn worker threads");
            std::process::exit(1);
        }
    };

    for handle in handles {
        if handle.join().is_err() {
            tracing::error!("a worker thread panicked");
        }
    }

    tracing::info!("shutdown complete");
}
