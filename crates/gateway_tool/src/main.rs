//! # gwctl - Gateway Router Operator Tool
//!
//! Checks a router configuration and translates between wire commands and
//! `(service_type, local_cmd)` pairs using that configuration's namespace.
//!
//! ```bash
//! # Validate the configuration
//! gwctl --config router.toml check
//!
//! # Which service handles wire command 2001?
//! gwctl decode 2001
//!
//! # Wire command for local command 7 on service type 3
//! gwctl encode 3 7
//! ```
//!
//! ## Exit Codes
//!
//! * **0**: Success
//! * **1**: Configuration, logging or command error

mod cli;
mod commands;

use cli::CliArgs;
use gateway_router::logging::setup_logging;
use gateway_router::RouterConfig;
use tracing::error;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let mut config = match RouterConfig::load_from_file(&args.config_path).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "❌ Failed to load configuration from {}: {e}",
                args.config_path.display()
            );
            std::process::exit(1);
        }
    };

    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    if let Err(e) = setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match commands::run(&config, &args.command) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            error!("❌ {e}");
            std::process::exit(1);
        }
    }
}
