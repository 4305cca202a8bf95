//! lambda-serve: run declared functions behind a local HTTP server.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                    LAMBDA-SERVE                       │
//!                  │                                                       │
//!   HTTP request   │  ┌─────────┐   ┌──────────┐   ┌──────────────────┐   │
//!  ────────────────┼─▶│  axum   │──▶│   cors   │──▶│ invoke::adapter  │   │
//!                  │  │ router  │   │(optional)│   │ event + context  │   │
//!                  │  └─────────┘   └──────────┘   └────────┬─────────┘   │
//!                  │                                         │             │
//!                  │                                         ▼             │
//!   HTTP response  │  ┌──────────────┐              ┌──────────────────┐  │
//!  ◀───────────────┼──│ http::response│◀── callback ─│ live function    │  │
//!                  │  └──────────────┘              │ (ArcSwap slot)   │  │
//!                  │                                 └────────▲─────────┘  │
//!                  │                                          │ swap       │
//!                  │  ┌──────────────┐   BuildEvent   ┌───────┴────────┐   │
//!                  │  │ build watcher│───────────────▶│ hot reloader   │   │
//!                  │  └──────────────┘                └────────────────┘   │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use lambda_serve::config::{load_config, FunctionDefinition};
use lambda_serve::http::HttpServer;
use lambda_serve::invoke::{builtin, LocalContextProvider};
use lambda_serve::lifecycle::{signals::shutdown_on_ctrl_c, Shutdown};
use lambda_serve::observability::{init_logging, metrics};
use lambda_serve::reload::{BuildWatcher, CatalogBuilder, OutputLoader};

#[derive(Parser)]
#[command(name = "lambda-serve")]
#[command(about = "Serve declared functions over a local HTTP server", long_about = None)]
struct Cli {
    /// Service file declaring functions and their events
    #[arg(short, long, default_value = "serverless.toml")]
    config: PathBuf,

    /// Port to listen on (overrides the service file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Stage prefix for every route (overrides the service file)
    #[arg(short, long)]
    stage: Option<String>,

    /// Path to watch for changes; defaults to the service file
    #[arg(short, long)]
    watch: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.stage.is_some() {
        config.stage = cli.stage;
    }

    init_logging(&config.observability);
    tracing::info!("lambda-serve v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::info!("Serving functions...");
    let server = HttpServer::new(&config, Arc::new(LocalContextProvider::new()))?;

    let served: HashSet<&str> = server.functions().iter().map(|f| f.id.as_str()).collect();
    let definitions: Vec<FunctionDefinition> = config
        .functions
        .iter()
        .filter(|d| served.contains(d.name.as_str()))
        .cloned()
        .collect();

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;

    let watch_path = cli.watch.unwrap_or_else(|| cli.config.clone());
    let (watcher, builds) = BuildWatcher::new(&watch_path, CatalogBuilder::new(&definitions, builtin::lookup));
    let _watcher = watcher.run()?;

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_ctrl_c(shutdown.clone()));

    server
        .run(listener, builds, Arc::new(OutputLoader::new()), shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
