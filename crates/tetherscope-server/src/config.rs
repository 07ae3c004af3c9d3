use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tetherscope_core::{RigGeometry, DEFAULT_CAPACITY};
use thiserror::Error;

/// Emitted frames a server pipeline keeps before dropping them, 10 s at 60 fps.
pub const DEFAULT_OUTPUT_RETENTION: usize = 600;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("fps must be a positive finite number, got {0}")]
    InvalidFps(f64),

    #[error("history capacity must be at least 1")]
    ZeroHistory,
}

/// Per-consumer loop settings.
#[derive(Debug, Clone, Serialize)]
pub struct LoopConfig {
    /// Target emissions per second.
    pub fps: f64,
    pub history_capacity: usize,
    /// Upper bound on a single transport write; a slower write ends the loop.
    pub write_timeout: Duration,
    /// Stop after this many cycles. `None` runs until cancelled.
    pub max_cycles: Option<u64>,
    /// Emitted frames kept per consumer before the output history is cleared.
    /// `None` keeps everything.
    pub output_retention: Option<usize>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            history_capacity: DEFAULT_CAPACITY,
            write_timeout: Duration::from_secs(1),
            max_cycles: None,
            output_retention: Some(DEFAULT_OUTPUT_RETENTION),
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(ConfigError::InvalidFps(self.fps));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroHistory);
        }
        Ok(())
    }

    /// Target cycle period, `1 / fps`. Zero for an fps that fails `validate`.
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.fps).unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Served under `/static`.
    pub static_dir: PathBuf,
    pub loop_config: LoopConfig,
    pub geometry: RigGeometry,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: PathBuf::from("viewer"),
            loop_config: LoopConfig::default(),
            geometry: RigGeometry::default(),
        }
    }
}
