//! Raw observations coming in from the detector and derived records going out.

use crate::angle::normalize_angle;
use crate::vector::Vector2D;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    #[error("timestamp must be finite, got {0}")]
    NonFiniteTimestamp(f64),

    #[error("position must be finite, got ({x}, {y})")]
    NonFinitePosition { x: f64, y: f64 },

    #[error("angular position must be finite, got {0}")]
    NonFiniteAngle(f64),
}

// ---------------------------------------------------------------------------
// Detection quality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionQuality {
    Good,
    Medium,
    Poor,
}

impl DetectionQuality {
    /// Coarse tag for a tracking confidence in `[0, 1]`.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            Self::Good
        } else if confidence >= 0.5 {
            Self::Medium
        } else {
            Self::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Medium => "medium",
            Self::Poor => "poor",
        }
    }
}

// ---------------------------------------------------------------------------
// Position sample
// ---------------------------------------------------------------------------

/// One detector observation of the end mass.
///
/// Fields are fixed at construction: the angle is normalized into `[0, 2π)`
/// and confidence is clamped into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionSample {
    timestamp: f64,
    sequence_id: u64,
    position: Vector2D,
    angular_position: f64,
    confidence: f64,
    quality: Option<DetectionQuality>,
}

impl PositionSample {
    pub fn new(
        timestamp: f64,
        sequence_id: u64,
        position: Vector2D,
        angular_position: f64,
        confidence: f64,
    ) -> Result<Self, SampleError> {
        if !timestamp.is_finite() {
            return Err(SampleError::NonFiniteTimestamp(timestamp));
        }
        if !position.is_finite() {
            return Err(SampleError::NonFinitePosition {
                x: position.x,
                y: position.y,
            });
        }
        if !angular_position.is_finite() {
            return Err(SampleError::NonFiniteAngle(angular_position));
        }
        // NaN confidence counts as no confidence at all
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Ok(Self {
            timestamp,
            sequence_id,
            position,
            angular_position: normalize_angle(angular_position),
            confidence,
            quality: None,
        })
    }

    pub fn with_quality(mut self, quality: DetectionQuality) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Seconds.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    pub fn position(&self) -> Vector2D {
        self.position
    }

    /// Radians, `[0, 2π)`.
    pub fn angular_position(&self) -> f64 {
        self.angular_position
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn quality(&self) -> Option<DetectionQuality> {
        self.quality
    }
}

// ---------------------------------------------------------------------------
// Frame sample
// ---------------------------------------------------------------------------

/// Fully derived telemetry for one sample.
///
/// When fewer than three usable samples were available the accelerations are
/// zero and `acceleration_available` is false.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameSample {
    pub timestamp: f64,
    pub sequence_id: u64,
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub acceleration: Vector2D,
    pub angular_position: f64,
    pub angular_velocity: f64,
    pub angular_acceleration: f64,
    pub confidence: f64,
    pub quality: Option<DetectionQuality>,
    pub acceleration_available: bool,
}

impl FrameSample {
    /// Linear speed, `|velocity|`.
    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }

    /// Sample timestamp as whole milliseconds (truncated toward zero).
    pub fn timestamp_millis(&self) -> i64 {
        (self.timestamp * 1000.0) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    #[test]
    fn test_new_normalizes_angle_and_clamps_confidence() {
        let s = PositionSample::new(1.0, 7, Vector2D::new(1.0, 2.0), -0.25, 1.4).unwrap();
        assert!((s.angular_position() - (TAU - 0.25)).abs() < 1e-12);
        assert_eq!(s.confidence(), 1.0);
        assert_eq!(s.quality(), None);

        let s = PositionSample::new(1.0, 7, Vector2D::ZERO, 0.0, f64::NAN).unwrap();
        assert_eq!(s.confidence(), 0.0);
    }

    #[test]
    fn test_new_rejects_non_finite() {
        assert!(matches!(
            PositionSample::new(f64::NAN, 0, Vector2D::ZERO, 0.0, 1.0),
            Err(SampleError::NonFiniteTimestamp(_))
        ));
        assert!(matches!(
            PositionSample::new(0.0, 0, Vector2D::new(f64::INFINITY, 0.0), 0.0, 1.0),
            Err(SampleError::NonFinitePosition { .. })
        ));
        assert!(matches!(
            PositionSample::new(0.0, 0, Vector2D::ZERO, f64::NEG_INFINITY, 1.0),
            Err(SampleError::NonFiniteAngle(_))
        ));
    }

    #[test]
    fn test_quality_from_confidence() {
        assert_eq!(DetectionQuality::from_confidence(0.95), DetectionQuality::Good);
        assert_eq!(DetectionQuality::from_confidence(0.8), DetectionQuality::Good);
        assert_eq!(DetectionQuality::from_confidence(0.6), DetectionQuality::Medium);
        assert_eq!(DetectionQuality::from_confidence(0.1), DetectionQuality::Poor);
        assert_eq!(DetectionQuality::Medium.label(), "medium");
    }

    #[test]
    fn test_timestamp_millis_truncates() {
        let frame = FrameSample {
            timestamp: 1234.5678,
            sequence_id: 1,
            position: Vector2D::ZERO,
            velocity: Vector2D::new(3.0, 4.0),
            acceleration: Vector2D::ZERO,
            angular_position: 0.0,
            angular_velocity: 0.0,
            angular_acceleration: 0.0,
            confidence: 1.0,
            quality: Some(DetectionQuality::Good),
            acceleration_available: false,
        };
        assert_eq!(frame.timestamp_millis(), 1_234_567);
        assert!((frame.speed() - 5.0).abs() < 1e-12);

        let json = serde_json::to_value(frame).unwrap();
        assert_eq!(json["quality"], "good");
    }
}
