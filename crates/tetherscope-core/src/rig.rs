use crate::vector::Vector2D;
use serde::{Deserialize, Serialize};

/// Static geometry of the rig as the viewer draws it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigGeometry {
    /// Position of the main body (rotation hub).
    pub main_position: Vector2D,
    pub tether_length: f64,
    pub main_size: f64,
    pub end_mass_radius: f64,
}

impl Default for RigGeometry {
    fn default() -> Self {
        Self {
            main_position: Vector2D::new(100.0, 100.0),
            tether_length: 150.0,
            main_size: 20.0,
            end_mass_radius: 12.0,
        }
    }
}

/// Camera-to-rig mapping produced by the calibration step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub pixels_per_meter: f64,
    /// Rotation center in image coordinates.
    pub center_point: Vector2D,
}

impl Default for Calibration {
    /// Identity mapping: one pixel per unit, centered at the origin.
    fn default() -> Self {
        Self {
            pixels_per_meter: 1.0,
            center_point: Vector2D::ZERO,
        }
    }
}

impl Calibration {
    /// Pixel coordinates to rig coordinates relative to the rotation center.
    pub fn to_world(&self, pixel: Vector2D) -> Vector2D {
        (pixel - self.center_point) / self.pixels_per_meter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_world() {
        let cal = Calibration {
            pixels_per_meter: 200.0,
            center_point: Vector2D::new(320.0, 240.0),
        };
        assert_eq!(cal.to_world(Vector2D::new(520.0, 140.0)), Vector2D::new(1.0, -0.5));
        assert_eq!(Calibration::default().to_world(Vector2D::new(3.0, 4.0)), Vector2D::new(3.0, 4.0));
    }
}
