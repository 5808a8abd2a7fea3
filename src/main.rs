//! LaMetric metrics relay entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lametric_relay::api::{collect_frames, create_router, AppState};
use lametric_relay::config::Config;
use lametric_relay::frames::SlotSource;
use lametric_relay::telemetry;
use lametric_relay::utils::shutdown_signal;

/// Mixpanel and GitHub metrics relay for LaMetric displays.
#[derive(Parser, Debug)]
#[command(name = "lametric-relay")]
#[command(about = "Serves Mixpanel and GitHub numbers as LaMetric frames")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the liveness and polling endpoints (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Fetch once and print the frames the device would receive.
    Frames,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("lametric_relay=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let fmt_layer = if args.json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();

    telemetry::init_metrics();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Frames) => cmd_frames().await,
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        None => cmd_serve(args.port).await,
    }
}

/// Load configuration, logging the failure before exiting.
fn load_config() -> anyhow::Result<Config> {
    Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration load failed: {}", e)
    })
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("LAMETRIC RELAY - CONFIGURATION CHECK");
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
            return Err(anyhow::anyhow!("Configuration check failed"));
        }
    };
    let layout = config.frame_layout()?;

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Mixpanel Project: {}", config.mixpanel_project_id);
    println!("  Mixpanel Report: {}", config.mixpanel_bookmark_id);
    println!("  Mixpanel API: {}", config.mixpanel_api_url);
    println!(
        "  GitHub Repository: {}/{} ({})",
        config.github_owner,
        config.github_repo,
        if config.github_token().is_some() { "Enabled" } else { "Disabled - no token" }
    );
    println!("  Frames: {}", layout.len());
    for (index, slot) in layout.slots().iter().enumerate() {
        let source = match &slot.source {
            SlotSource::Analytics(metric) => format!("mixpanel {}", metric),
            SlotSource::Repo(field) => format!("github {}", field),
        };
        println!("    [{}] {} -> {}", index, slot.icon, source);
    }
    println!("  Port: {}", config.port);
    println!(
        "  Prometheus: {}",
        if config.metrics_enabled {
            format!("Enabled on :{}", config.metrics_port)
        } else {
            "Disabled".to_string()
        }
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Fetch once and print the polling response.
async fn cmd_frames() -> anyhow::Result<()> {
    let config = load_config()?;
    let state = AppState::from_config(&config)?;

    let response = collect_frames(&state).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

/// Run the HTTP server until shutdown.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = load_config()?;

    if let Some(port) = port_override {
        config.port = port;
        config.validate()?;
    }

    let state = AppState::from_config(&config)?;

    info!("Configuration loaded successfully");
    info!("Frames: {}", state.layout.len());
    info!(
        "Repository stats: {}",
        if config.github_token().is_some() { "enabled" } else { "disabled" }
    );

    if config.metrics_enabled {
        telemetry::install_exporter(SocketAddr::from(([0, 0, 0, 0], config.metrics_port)))?;
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
