//! Roblox/Rolimons CORS relay entry point.

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use roblox_relay::api::{create_router, AppState};
use roblox_relay::config::Config;
use roblox_relay::metrics;
use roblox_relay::upstream::UpstreamClient;
use roblox_relay::utils::shutdown_signal;

/// Roblox/Rolimons CORS relay.
#[derive(Parser, Debug)]
#[command(name = "roblox-relay")]
#[command(about = "Relay browser requests to the Roblox catalog and Rolimons item APIs")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP listen port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the relay server (default).
    Serve {
        /// HTTP listen port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("roblox_relay=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        None => cmd_serve(args.port).await,
    }
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("ROBLOX RELAY - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Listen: {}", config.listen_addr());
    println!("  Catalog details upstream: {}", config.catalog_details_url);
    println!("  Item details upstream: {}", config.item_details_url);
    println!("  Body limit: {} bytes", config.body_limit_bytes);
    println!(
        "  CORS origins: {}",
        config.cors_allowed_origins.as_deref().unwrap_or("* (any)")
    );
    println!(
        "  Upstream timeout: {}",
        config
            .upstream_timeout_ms
            .map_or_else(|| "none".to_string(), |ms| format!("{ms}ms"))
    );
    println!(
        "  Metrics: {}",
        if config.metrics_enabled { "Enabled" } else { "Disabled" }
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Run the relay until a shutdown signal arrives.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Some(port) = port_override {
        config.port = port;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    if config.allowed_origins()?.is_none() {
        warn!("CORS allows any origin; set CORS_ALLOWED_ORIGINS to restrict it");
    }
    if config.upstream_timeout_ms.is_none() {
        info!("No upstream timeout configured; upstream calls wait indefinitely");
    }

    let upstream = UpstreamClient::new(&config)?;
    let mut app_state = AppState::new(upstream);

    if config.metrics_enabled {
        let handle = metrics::install()?;
        metrics::spawn_upkeep(handle.clone(), metrics::UPKEEP_INTERVAL);
        app_state = app_state.with_metrics(handle);
    }

    let router = create_router(app_state, &config)?;

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("Proxy listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
