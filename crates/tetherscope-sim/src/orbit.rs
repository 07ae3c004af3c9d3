//! End mass circling the hub at a constant rate, with optional detector noise
//! and dropped detections.

use crate::source::{SampleSource, Timebase};
use nalgebra::{Rotation2, Vector2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tetherscope_core::{
    angle_from_center, Calibration, DetectionQuality, PositionSample, Vector2D,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitConfigError {
    #[error("orbit radius must be positive and finite, got {0}")]
    Radius(f64),

    #[error("jitter standard deviation must be non-negative and finite, got {0}")]
    Jitter(f64),

    #[error("dropout probability must be within [0, 1], got {0}")]
    Dropout(f64),
}

#[derive(Debug, Clone)]
pub struct OrbitConfig {
    /// Hub position in image coordinates.
    pub center: Vector2D,
    /// Tether length in image units.
    pub radius: f64,
    /// rad/s, positive is counter-clockwise.
    pub angular_rate: f64,
    pub start_angle: f64,
    /// Std of Gaussian noise added to each position component.
    pub jitter_std: f64,
    /// Chance that a cycle yields no detection.
    pub dropout_probability: f64,
    pub seed: u64,
    /// Applied to every generated position before it is emitted.
    pub calibration: Calibration,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            center: Vector2D::new(100.0, 100.0),
            radius: 150.0,
            angular_rate: std::f64::consts::PI, // half a turn per second
            start_angle: 0.0,
            jitter_std: 0.0,
            dropout_probability: 0.0,
            seed: 42,
            calibration: Calibration::default(),
        }
    }
}

impl OrbitConfig {
    fn validate(&self) -> Result<(), OrbitConfigError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(OrbitConfigError::Radius(self.radius));
        }
        if !(self.jitter_std.is_finite() && self.jitter_std >= 0.0) {
            return Err(OrbitConfigError::Jitter(self.jitter_std));
        }
        if !(0.0..=1.0).contains(&self.dropout_probability) {
            return Err(OrbitConfigError::Dropout(self.dropout_probability));
        }
        Ok(())
    }
}

pub struct OrbitSource {
    config: OrbitConfig,
    timebase: Timebase,
    rng: StdRng,
    jitter: Normal<f64>,
    frame: u64,
    /// Timestamp of frame 0, so wall-clock runs still start at `start_angle`.
    epoch: Option<f64>,
}

impl OrbitSource {
    pub fn new(config: OrbitConfig, timebase: Timebase) -> Result<Self, OrbitConfigError> {
        config.validate()?;
        let jitter = Normal::new(0.0, config.jitter_std)
            .map_err(|_| OrbitConfigError::Jitter(config.jitter_std))?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            timebase,
            jitter,
            frame: 0,
            epoch: None,
        })
    }

    /// Noise-free pixel position at `elapsed` seconds into the run.
    pub fn ideal_position(&self, elapsed: f64) -> Vector2D {
        let theta = self.config.start_angle + self.config.angular_rate * elapsed;
        let arm = Rotation2::new(theta) * Vector2::new(self.config.radius, 0.0);
        (self.config.center.to_na() + arm).into()
    }
}

impl SampleSource for OrbitSource {
    fn next_sample(&mut self) -> Option<PositionSample> {
        let index = self.frame;
        self.frame += 1;

        let timestamp = self.timebase.at(index);
        let epoch = *self.epoch.get_or_insert(timestamp);

        let p_drop = self.config.dropout_probability;
        if p_drop > 0.0 && self.rng.gen_bool(p_drop) {
            tracing::trace!(frame = index, "simulated detection dropout");
            return None;
        }

        let ideal = self.ideal_position(timestamp - epoch);
        let noise = if self.config.jitter_std > 0.0 {
            Vector2D::new(
                self.jitter.sample(&mut self.rng),
                self.jitter.sample(&mut self.rng),
            )
        } else {
            Vector2D::ZERO
        };
        let pixel = ideal + noise;

        let confidence = (1.0 - noise.magnitude() / self.config.radius).clamp(0.0, 1.0);
        let angle = angle_from_center(self.config.center, pixel);
        let position = self.config.calibration.to_world(pixel);

        PositionSample::new(timestamp, index + 1, position, angle, confidence)
            .ok()
            .map(|s| s.with_quality(DetectionQuality::from_confidence(confidence)))
    }
}
