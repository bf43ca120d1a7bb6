use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use sumup_gateway::app::config::{Cli, Config};
use sumup_gateway::services::{InMemoryPaymentStore, ProviderSettings, SumUpClient, SumUpProvider};
use sumup_gateway::{build_router, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    info!("Starting SumUp gateway on port {}", config.server_port);

    let client = SumUpClient::new(&config.sumup_base_url, config.http_timeout())?;
    let merchant_code = match config.merchant_code.clone() {
        Some(code) => code,
        None => client
            .validate_access_token_and_get_merchant_code(&config.access_token)
            .await
            .context("resolving the SumUp merchant code")?,
    };

    let settings = ProviderSettings {
        access_token: config.access_token.clone(),
        merchant_code,
        public_url: config.public_url.clone(),
    };
    let store = Arc::new(InMemoryPaymentStore::new());
    let provider = Arc::new(SumUpProvider::new(client, settings, store));
    let app = build_router(AppState::new(provider)?);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down");
}
