//! Course Player · interactive player for AI-generated courses
//!
//! - Axum HTTP + WebSocket API over per-tab course sessions
//! - Uploads PDFs to the course generator and plays back the returned course
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                        : u16 (default 3000)
//!   COURSE_PLAYER_CONFIG        : path to TOML config (same keys as below, lowercase)
//!   COURSE_BACKEND_URL          : generator base URL, default "http://localhost:8000"
//!   COURSE_UPLOAD_PATH          : default "/test-upload"
//!   COURSE_REQUEST_TIMEOUT_SECS : default 120
//!   CELEBRATION_MS              : default 3000
//!   MAX_UPLOAD_BYTES            : default 25 MiB
//!   STATIC_DIR                  : default "./static"
//!   LOG_LEVEL                   : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT                  : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod celebration;
mod session;
mod view;
mod loader;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::PlayerConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = PlayerConfig::load();
  let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

  // Shared state: config, generator client, live sessions.
  let state = Arc::new(AppState::new(config)?);

  // HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  let listener = TcpListener::bind(addr).await?;
  info!(target: "course_player", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "course_player", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "course_player", "Shutdown signal received");
}
