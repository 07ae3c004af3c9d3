//! # Tetherscope Core
//!
//! Kinematics for the spinning tether test rig. This crate holds the part of
//! the telemetry path that has to get the numbers right:
//! - Fixed-capacity sample history (`HistoryStore`)
//! - Finite-difference velocity/acceleration (`DerivativeEstimator`)
//! - Angle wrapping across the 0/2π seam
//! - Output records (`FrameSample`) and per-session summaries
//!
//! Nothing in here performs I/O or owns a runtime. Every pipeline instance is
//! single-writer; wrap it in your own lock if more than one task touches it.

pub mod angle;
pub mod history;
pub mod kinematics;
pub mod rig;
pub mod sample;
pub mod summary;
pub mod vector;

// Re-export core types
pub use angle::{angle_from_center, normalize_angle, wrap_angle};
pub use history::{HistoryError, HistoryStats, HistoryStore, DEFAULT_CAPACITY};
pub use kinematics::{DerivativeEstimator, Estimate};
pub use rig::{Calibration, RigGeometry};
pub use sample::{DetectionQuality, FrameSample, PositionSample, SampleError};
pub use summary::SessionSummary;
pub use vector::Vector2D;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
