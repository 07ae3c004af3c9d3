//! Tetherscope Simulation Library
//!
//! Stand-ins for the camera detector: sources that hand out one
//! `PositionSample` per call, or nothing when "detection" fails.

pub mod orbit;
pub mod source;
pub mod toggle;

// Re-export main types
pub use orbit::{OrbitConfig, OrbitConfigError, OrbitSource};
pub use source::{SampleSource, Timebase};
pub use toggle::TogglePattern;
