use clap::Parser;
use inkshare_server::{AppState, Config, app};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkshare_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::parse();
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let state = Arc::new(AppState::new(&config));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    let addr = listener.local_addr()?;
    info!("InkShare relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);
    info!("Uploads stored in {}", config.upload_dir.display());

    axum::serve(listener, app(state)).await
}
