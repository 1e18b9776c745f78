//! dbkeeper entry point
//!
//! Parses the flags, loads the configuration, installs logging and hands
//! over to the web application or the command-line operations.

use dbkeeper::clap::{self, ApplicationType};
use dbkeeper::{commands, server, Config};
use dbkeeper_monitor::init_logging;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = clap::parse();

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("It looks like your config is invalid. The following error occurred: {e}");
            std::process::exit(1);
        }
    };
    if let Some(level) = &args.log_level {
        config.log.log_level = level.clone();
    }

    let guard = match init_logging(&config.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            std::process::exit(1);
        }
    };
    info!("🚀 Starting dbkeeper {}", clap::version());

    let result = match args.application_type {
        ApplicationType::Application => server::run(&config).await,
        ApplicationType::Commandline => commands::run(&args, &config).await,
    };

    if let Err(e) = result {
        error!("❌ {:#}", e);
        drop(guard);
        std::process::exit(1);
    }
    info!("✅ Database operation completed successfully");
}
