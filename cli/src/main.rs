//! Travel Booking CLI server
//!
//! Headless REST service for trip scheduling and seat reservations.
//!
//! ```sh
//! # Run with default config (~/.config/travel-booking/config.toml)
//! travel-booking
//!
//! # Custom config path
//! travel-booking --config /etc/travel-booking/config.toml
//!
//! # Override the port
//! travel-booking --api-port 8080
//!
//! # Validate config without starting
//! travel-booking --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use travel_booking::config::{AppConfig, CONFIG_ENV};
use travel_booking::server::{init_tracing, ServerHandle, ServerOptions};

/// Travel booking service: vehicles, trips and seat reservations over REST.
#[derive(Parser, Debug)]
#[command(
    name = "travel-booking",
    version,
    about = "Trip scheduling and seat reservation service",
    long_about = "REST API server for scheduling vehicle trips and booking seats.\n\n\
                  Default config: ~/.config/travel-booking/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .unwrap_or_else(travel_booking::default_config_path);

    let loaded = AppConfig::load(&config_path);

    if cli.check {
        let mut config = match loaded {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("❌ {}: {}", config_path.display(), e);
                std::process::exit(1);
            }
        };
        if let Some(port) = cli.api_port {
            config.server.port = port;
        }
        if let Some(level) = cli.log_level {
            config.logging.level = level;
        }
        if let Err(e) = config.validate() {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.address());
        println!("   Database    : {}", config.database.url);
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    let mut config = match loaded {
        Ok(mut cfg) => {
            if let Some(ref level) = cli.log_level {
                cfg.logging.level = level.clone();
            }
            // Init tracing first so subsequent logs are formatted properly
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            let mut cfg = AppConfig::default();
            if let Some(ref level) = cli.log_level {
                cfg.logging.level = level.clone();
            }
            init_tracing(&cfg);
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
            cfg
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.api_port {
        info!("CLI override: api_port = {}", port);
        config.server.port = port;
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
