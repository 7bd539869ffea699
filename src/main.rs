use std::path::PathBuf;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use swerve_zenoh_runtime::config::{DEFAULT_MODULE_PREFIX, DriveConfig};
use swerve_zenoh_runtime::io::IoMode;
use swerve_zenoh_runtime::runtime::{self, RuntimeOptions};

/// Swerve drive runtime: operator input in, module setpoints out
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Simulate modules and gyro instead of bridging to a hardware node
    #[arg(long)]
    sim: bool,

    /// JSON drive config; defaults are used for missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable lazy setpoint optimization (deadband, freeze, cosine scaling)
    #[arg(long)]
    eager: bool,

    /// Topic prefix for module setpoints and feedback
    #[arg(long, default_value = DEFAULT_MODULE_PREFIX)]
    modules_prefix: String,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match DriveConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => DriveConfig::default(),
    };

    let io_mode = if args.sim {
        IoMode::Simulated
    } else {
        IoMode::Bridged {
            prefix: args.modules_prefix,
        }
    };
    let lazy = config.lazy_optimization && !args.eager;

    let options = RuntimeOptions {
        config,
        io_mode,
        lazy,
    };
    if let Err(e) = runtime::run(options).await {
        error!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
