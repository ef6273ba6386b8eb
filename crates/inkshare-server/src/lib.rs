//! InkShare relay server.
//!
//! Fans every WebSocket frame out to all other connections and stores uploaded
//! documents so participants can share them by URL.

pub mod config;
pub mod relay;
pub mod upload;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use config::Config;
pub use relay::{Frame, Peer, Relay};
pub use upload::{UploadError, UploadResponse};

/// Shared application state
pub struct AppState {
    pub relay: Relay,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            relay: Relay::new(config.channel_capacity as usize),
            upload_dir: config.upload_dir.clone(),
            max_upload_bytes: config.max_upload_bytes(),
        }
    }
}

/// Build the router for `state`.
pub fn app(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(&state.upload_dir);
    Router::new()
        .route("/", get(index))
        .route("/ws", get(relay::ws_handler))
        .route("/health", get(health))
        .route(
            "/api/file",
            post(upload::upload_file).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .nest_service("/uploads", uploads)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Index page
async fn index() -> &'static str {
    "InkShare Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "peers": state.relay.peer_count(),
    }))
}
