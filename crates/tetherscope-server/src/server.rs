//! WebSocket front end: one independent pipeline per connected viewer.

use crate::cadence::{CadenceLoop, Shutdown};
use crate::config::{LoopConfig, ServerConfig};
use crate::pipeline::Pipeline;
use crate::transport::WsTransport;
use anyhow::Context;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tetherscope_core::RigGeometry;
use tetherscope_sim::SampleSource;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::services::ServeDir;

/// Builds a fresh sample source for the consumer with the given id.
pub type SourceFactory = Arc<dyn Fn(u64) -> Box<dyn SampleSource + Send> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    loop_config: LoopConfig,
    geometry: RigGeometry,
    sources: SourceFactory,
    shutdown: Shutdown,
    next_id: Arc<AtomicU64>,
    active: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(
        loop_config: LoopConfig,
        geometry: RigGeometry,
        sources: SourceFactory,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            loop_config,
            geometry,
            sources,
            shutdown,
            next_id: Arc::new(AtomicU64::new(1)),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn active_consumers(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }
}

/// Creates the Axum router with all routes
pub fn create_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(handle_stream))
        .route("/ws", get(handle_stream))
        .route("/api/config", get(handle_config))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

/// Binds, serves until Ctrl-C, then tells every running loop to stop.
pub async fn serve(config: ServerConfig, sources: SourceFactory) -> anyhow::Result<()> {
    config.loop_config.validate().context("invalid loop configuration")?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let (stop_tx, stop_rx) = watch::channel(false);
    let state = AppState::new(
        config.loop_config.clone(),
        config.geometry,
        sources,
        Shutdown::new(stop_rx),
    );
    let app = create_router(state, &config.static_dir);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(fps = config.loop_config.fps, "telemetry server listening on ws://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("shutdown requested");
            let _ = stop_tx.send(true);
        })
        .await
        .context("server error")?;

    Ok(())
}

async fn handle_stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_consumer(state, socket))
}

async fn run_consumer(state: AppState, socket: WebSocket) {
    let id = state.next_id.fetch_add(1, Ordering::Relaxed);
    let source = (state.sources)(id);
    let capacity = state.loop_config.history_capacity;
    let mut pipeline = match Pipeline::new(source, capacity, state.geometry) {
        Ok(p) => p.with_output_retention(state.loop_config.output_retention),
        Err(e) => {
            tracing::warn!(consumer = id, "cannot start pipeline: {}", e);
            return;
        }
    };
    let cadence = match CadenceLoop::new(state.loop_config.clone()) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(consumer = id, "cannot start loop: {}", e);
            return;
        }
    };
    let mut transport = WsTransport::new(socket);

    let active = state.active.fetch_add(1, Ordering::Relaxed) + 1;
    tracing::info!(consumer = id, active, "consumer connected");

    let report = cadence
        .run(&mut pipeline, &mut transport, state.shutdown.clone())
        .await;

    let active = state.active.fetch_sub(1, Ordering::Relaxed) - 1;
    tracing::info!(
        consumer = id,
        active,
        cycles = report.cycles,
        emitted = report.emitted,
        overruns = report.overruns,
        "consumer disconnected"
    );
}

#[derive(Debug, Serialize)]
struct ConfigResponse {
    fps: f64,
    history_capacity: usize,
    geometry: RigGeometry,
    active_consumers: usize,
}

async fn handle_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        fps: state.loop_config.fps,
        history_capacity: state.loop_config.history_capacity,
        geometry: state.geometry,
        active_consumers: state.active_consumers(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tetherscope_sim::{Timebase, TogglePattern};

    fn state() -> AppState {
        let geometry = RigGeometry::default();
        let sources: SourceFactory = Arc::new(move |_: u64| {
            Box::new(TogglePattern::new(geometry.main_position, Timebase::Wall))
                as Box<dyn SampleSource + Send>
        });
        AppState::new(LoopConfig::default(), geometry, sources, Shutdown::never())
    }

    #[tokio::test]
    async fn test_config_endpoint() {
        let Json(cfg) = handle_config(State(state())).await;
        assert_eq!(cfg.fps, 60.0);
        assert_eq!(cfg.history_capacity, 100);
        assert_eq!(cfg.geometry.tether_length, 150.0);
        assert_eq!(cfg.active_consumers, 0);
    }

    #[tokio::test]
    async fn test_serve_rejects_invalid_loop_config() {
        let st = state();
        let config = ServerConfig {
            port: 0,
            loop_config: LoopConfig {
                fps: 0.0,
                ..LoopConfig::default()
            },
            ..ServerConfig::default()
        };
        let err = serve(config, st.sources.clone()).await.unwrap_err();
        assert!(format!("{err:#}").contains("fps"), "{err:#}");
    }

    #[test]
    fn test_router_builds() {
        let _router = create_router(state(), Path::new("viewer"));
    }

    #[test]
    fn test_factory_gives_independent_sources() {
        let st = state();
        let mut a = (st.sources)(1);
        let mut b = (st.sources)(2);
        let _ = a.next_sample();
        let _ = a.next_sample();
        // b starts from its own first frame
        assert_eq!(b.next_sample().map(|s| s.sequence_id()), Some(1));
    }
}
