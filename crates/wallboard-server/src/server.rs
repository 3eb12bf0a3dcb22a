//! Axum HTTP + WebSocket surface.
//!
//! `GET /ws` upgrades a terminal's connection and hands it to
//! [`crate::session::run`]; `GET /health` reports liveness. Terminal
//! identity comes from the `client` query parameter, the peer address from
//! `X-Forwarded-For` with the socket address as fallback.

use std::net::SocketAddr;
use std::time::Instant;

use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use wallboard_core::ClientIdentity;
use wallboard_core::timing::MAX_MESSAGE_SIZE;
use wallboard_store::Store;

use crate::broker::BrokerHandle;
use crate::session;

/// Shared state accessible from handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub broker: BrokerHandle,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Store, broker: BrokerHandle) -> Self {
        Self {
            store,
            broker,
            start_time: Instant::now(),
        }
    }
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the listener fails.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "web server listening");
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

#[derive(Debug, Deserialize)]
struct ConnectParams {
    /// Stable opaque terminal identifier; absent for anonymous terminals.
    client: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    connections: usize,
    uptime_seconds: u64,
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.broker.connection_count().await,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ws — WebSocket upgrade.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    headers: HeaderMap,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let identity = ClientIdentity::from_request(params.client.as_deref());
    let ip = peer_ip(&headers, peer);
    info!(client = identity.name(), ip = %ip, "terminal connecting");

    ws.max_message_size(MAX_MESSAGE_SIZE).on_upgrade(move |socket| {
        session::run(state.store, state.broker, identity, ip, socket)
    })
}

/// Peer address: first `X-Forwarded-For` entry, else the socket address.
fn peer_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}
