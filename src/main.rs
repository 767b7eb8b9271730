//! SIGAP - Convective Early Warning Engine
//!
//! Long-running operational process for puting beliung nowcasting.
//!
//! # Usage
//!
//! ```bash
//! # Run the operational loop with the synthetic source
//! cargo run --release
//!
//! # Single demo cycle with an embedded convective cell, then exit
//! cargo run --release -- --once --demo-cell
//!
//! # Custom configuration and cadence
//! cargo run --release -- --config sigap.toml --interval 5
//! ```
//!
//! # Environment Variables
//!
//! - `SIGAP_CONFIG`: Path to the TOML config (overridden by `--config`)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use sigap::config::SigapConfig;
use sigap::ops::OperationalLoop;
use sigap::source::SyntheticSource;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "sigap")]
#[command(about = "SIGAP Convective Early Warning Engine")]
#[command(version)]
struct CliArgs {
    /// Path to the TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the cycle interval in minutes
    #[arg(short, long)]
    interval: Option<u64>,

    /// Override the output directory for status and event files
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Run a single cycle and exit (non-zero exit on failure)
    #[arg(long)]
    once: bool,

    /// Embed a deterministic convective cell in the synthetic source
    #[arg(long)]
    demo_cell: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();

    let mut config = SigapConfig::load(args.config.as_deref())?;
    if let Some(interval) = args.interval {
        config.runtime.interval_minutes = interval;
    }
    if let Some(output_dir) = args.output_dir {
        config.runtime.output_dir = output_dir;
    }

    info!(
        region = %config.region.name,
        interval_minutes = config.runtime.interval_minutes,
        output_dir = %config.runtime.output_dir.display(),
        "SIGAP starting"
    );

    let mut source = SyntheticSource::new(config.region.bbox);
    if args.demo_cell {
        // Center of the synthetic grid
        source = source.with_convective_cell(10, 10);
        warn!("Demo convective cell enabled — output is not real guidance");
    }

    let mut ops =
        OperationalLoop::new(config, source).context("building operational loop")?;

    if args.once {
        let status = ops.run_cycle().context("detection cycle failed")?;
        info!(status = %status.risk_text, risk_value = status.risk_value, "Cycle complete");
        println!("{}", status.narration);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    let stats = ops.run(cancel).await;
    info!(
        cycles = stats.cycles_completed,
        failures = stats.cycles_failed,
        events = stats.events_logged,
        "SIGAP stopped"
    );
    Ok(())
}
