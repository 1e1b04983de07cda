//! Axum-based read-only HTTP API over the coordinator's published state

mod logs;

pub use logs::logs_stream;

use crate::config::Config;
use crate::coordinator::{CoordinatorStatus, Snapshot, UpdateCoordinator};
use crate::error::{EblocError, Result};
use crate::sensors;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub snapshot_rx: watch::Receiver<Option<Arc<Snapshot>>>,
    pub status_rx: watch::Receiver<CoordinatorStatus>,
    /// Configuration with the cookie already masked
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(coordinator: &UpdateCoordinator, config: &Config) -> Self {
        Self {
            snapshot_rx: coordinator.subscribe(),
            status_rx: coordinator.subscribe_status(),
            config: Arc::new(config.redacted()),
        }
    }

    fn latest(&self) -> Option<Arc<Snapshot>> {
        self.snapshot_rx.borrow().clone()
    }
}

fn no_data() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({"error": "no successful refresh yet"})),
    )
        .into_response()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.status_rx.borrow().clone();
    Json(status)
}

async fn snapshot(State(state): State<AppState>) -> Response {
    match state.latest() {
        Some(snap) => Json(&*snap).into_response(),
        None => no_data(),
    }
}

async fn sensors_all(State(state): State<AppState>) -> Response {
    match state.latest() {
        Some(snap) => Json(sensors::all_sensors(&snap)).into_response(),
        None => no_data(),
    }
}

async fn sensor_one(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if !sensors::SENSOR_IDS.contains(&id.as_str()) {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": format!("unknown sensor '{}'", id)})),
        )
            .into_response();
    }
    match state.latest() {
        Some(snap) => match sensors::sensor_by_id(&snap, &id) {
            Some(sensor) => Json(sensor).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        None => no_data(),
    }
}

async fn version() -> impl IntoResponse {
    Json(sensors::update_info())
}

async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.config.as_ref().clone())
}

async fn get_config_schema() -> impl IntoResponse {
    let schema = schemars::schema_for!(crate::config::Config);
    Json(serde_json::to_value(&schema).unwrap_or(serde_json::json!({"error":"schema"})))
}

/// One `snapshot` event per published snapshot, starting with the next one
async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let stream = WatchStream::from_changes(state.snapshot_rx.clone()).filter_map(|snap| {
        let snap = snap?;
        Event::default()
            .event("snapshot")
            .json_data(&*snap)
            .ok()
            .map(Ok::<Event, std::convert::Infallible>)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/api/snapshot", get(snapshot))
        .route("/api/sensors", get(sensors_all))
        .route("/api/sensors/{id}", get(sensor_one))
        .route("/api/version", get(version))
        .route("/api/config", get(get_config))
        .route("/api/config/schema", get(get_config_schema))
        .route("/api/events", get(events))
        .merge(logs::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let router = build_router(state);
    let logger = crate::logging::get_logger("web");
    logger.info(&format!(
        "Starting web server; requested host={}, port={}",
        host, port
    ));

    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| EblocError::web(format!("Failed to bind {}: {}", addr, e)))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| EblocError::web(e.to_string()))?;
    logger.info(&format!("Web server listening at http://{}", local_addr));

    axum::serve(listener, router)
        .await
        .map_err(|e| EblocError::web(e.to_string()))
}
