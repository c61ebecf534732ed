//! Pitwall · F1 Trivia Backend
//!
//! - Axum HTTP + WebSocket API
//! - Driver and car rounds with per-difficulty countdown timers
//! - Optional remote leaderboard store (plain JSON endpoint or gist)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT          : u16 (default 3000)
//!   PITWALL_CONFIG_PATH : path to TOML config (ranking rules, pools, store)
//!   LEADERBOARD_URL     : store endpoint; enables remote standings if present
//!   LEADERBOARD_BACKEND : "plain" (default) or "gist"
//!   LEADERBOARD_TOKEN   : auth token, required by the gist backend
//!   LOG_LEVEL    : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod pools;
mod engine;
mod leaderboard;
mod state;
mod protocol;
mod chat;
mod store;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (name pools, ranking rules, store client).
  let cfg = config::load_config_from_env();
  let state = Arc::new(AppState::new(&cfg));

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "pitwall_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
