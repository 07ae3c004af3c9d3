//! Wire format expected by the existing viewer.
//!
//! Field names are fixed. Accelerations are not part of this payload, so the
//! zero-filled acceleration of early frames never reaches the viewer.

use serde::Serialize;
use tetherscope_core::{FrameSample, RigGeometry, Vector2D};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPayload {
    pub main_position: Vector2D,
    pub end_mass_position: Vector2D,
    pub linear_speed: Vec3,
    pub angular_speed: Vec3,
    pub tether_length: f64,
    pub main_size: f64,
    pub end_mass_radius: f64,
    /// Sample time in whole milliseconds.
    pub timestamp: i64,
}

impl TelemetryPayload {
    pub fn from_frame(frame: &FrameSample, geometry: &RigGeometry) -> Self {
        Self {
            main_position: geometry.main_position,
            end_mass_position: frame.position,
            linear_speed: Vec3 {
                x: frame.velocity.x,
                y: frame.velocity.y,
                z: 0.0,
            },
            angular_speed: Vec3 {
                x: 0.0,
                y: 0.0,
                z: frame.angular_velocity,
            },
            tether_length: geometry.tether_length,
            main_size: geometry.main_size,
            end_mass_radius: geometry.end_mass_radius,
            timestamp: frame.timestamp_millis(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame() -> FrameSample {
        FrameSample {
            timestamp: 1700000000.0125,
            sequence_id: 9,
            position: Vector2D::new(150.0, 160.0),
            velocity: Vector2D::new(600.0, -600.0),
            acceleration: Vector2D::ZERO,
            angular_position: 0.5,
            angular_velocity: 2.5,
            angular_acceleration: 0.0,
            confidence: 1.0,
            quality: None,
            acceleration_available: false,
        }
    }

    #[test]
    fn test_payload_shape() {
        let payload = TelemetryPayload::from_frame(&frame(), &RigGeometry::default());
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "mainPosition": { "x": 100.0, "y": 100.0 },
                "endMassPosition": { "x": 150.0, "y": 160.0 },
                "linearSpeed": { "x": 600.0, "y": -600.0, "z": 0.0 },
                "angularSpeed": { "x": 0.0, "y": 0.0, "z": 2.5 },
                "tetherLength": 150.0,
                "mainSize": 20.0,
                "endMassRadius": 12.0,
                "timestamp": 1700000000012i64,
            })
        );
    }

    #[test]
    fn test_timestamp_is_integer_millis() {
        let json = TelemetryPayload::from_frame(&frame(), &RigGeometry::default())
            .to_json()
            .unwrap();
        assert!(json.contains("\"timestamp\":1700000000012"), "{json}");
        assert!(!json.contains("1700000000012."));
    }
}
