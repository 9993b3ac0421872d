use std::sync::Arc;

use clap::Parser;
use moodwise_core::{GroqClient, MemoryStore, MoodwiseConfig};
use tokio::sync::broadcast;
use tracing_subscriber::fmt;

use moodwise_server::http::{self, HttpState};
use moodwise_server::telemetry;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "moodwise.toml")]
    config: String,

    /// Override http.port from the config file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience; production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = match MoodwiseConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };
    if let Some(port) = args.port {
        config.http.port = port;
    }

    fmt()
        .with_env_filter(telemetry::log_filter(&config.service.log_level))
        .init();

    let companion = match GroqClient::new(config.groq.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create Groq client: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(model = companion.model(), "Groq companion ready");

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let state = HttpState {
        store: Arc::new(MemoryStore::new()),
        companion: Arc::new(companion),
        config,
    };

    http::start_http_server(state, tx.subscribe()).await?;

    Ok(())
}
