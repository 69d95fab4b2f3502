use anyhow::{Context, Result};
use clap::Parser;
use config_engine::{render_yaml, ConfigEngine};
use std::{net::SocketAddr, path::PathBuf};
use tracing::info;

use ledger_server::{create_app, server::load_chart_file, LedgerServer};

/// Ledger Engine HTTP Server
#[derive(Parser, Debug)]
#[command(name = "ledger-server")]
#[command(about = "Double-entry ledger and derived payables/receivables HTTP API")]
struct Args {
    /// Configuration file path (YAML or TOML)
    #[arg(short, long, env = "LEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// Override `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`
    #[arg(short, long)]
    port: Option<u16>,

    /// JSON array of accounts seeding the chart
    #[arg(long)]
    chart: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = ConfigEngine::standard(args.config.clone())
        .load()
        .context("loading configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if args.print_config {
        print!("{}", render_yaml(&config)?);
        return Ok(());
    }

    let _guard = logger_redacted::init_logging(&config.logging).context("initializing logging")?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Ledger Engine HTTP Server");

    let seed = match &args.chart {
        Some(path) => load_chart_file(path)?,
        None => Vec::new(),
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("parsing bind address")?;

    let server = LedgerServer::from_config(config, seed).await?;
    let app = create_app(server);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Could not install Ctrl+C handler");
    }
}
