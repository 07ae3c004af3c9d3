//! Tetherscope Server
//!
//! Streams derived rig telemetry to viewers. Each connected consumer gets its
//! own pipeline (history, estimator, source) driven by a fixed-cadence loop;
//! nothing is shared between consumers.

pub mod cadence;
pub mod config;
pub mod payload;
pub mod pipeline;
pub mod server;
pub mod transport;

pub use cadence::{pacing_delay, CadenceLoop, CancelReason, LoopExit, LoopReport, LoopState, Shutdown};
pub use config::{ConfigError, LoopConfig, ServerConfig, DEFAULT_OUTPUT_RETENTION};
pub use payload::{TelemetryPayload, Vec3};
pub use pipeline::{Pipeline, Step};
pub use server::{create_router, serve, AppState, SourceFactory};
pub use transport::{MemoryTransport, Transport, TransportError, WsTransport};
