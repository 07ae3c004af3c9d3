//! Two-point toggle used while developing the viewer: the end mass jumps
//! between two spots with a four-frame period.

use crate::source::{SampleSource, Timebase};
use tetherscope_core::{angle_from_center, PositionSample, Vector2D};

pub struct TogglePattern {
    center: Vector2D,
    rest: Vector2D,
    excursion: Vector2D,
    timebase: Timebase,
    frame: u64,
}

impl TogglePattern {
    pub fn new(center: Vector2D, timebase: Timebase) -> Self {
        Self {
            center,
            rest: Vector2D::new(150.0, 150.0),
            excursion: Vector2D::new(160.0, 160.0),
            timebase,
            frame: 0,
        }
    }

    /// Position for a given frame index: the excursion point on `index % 4 == 1`.
    pub fn position_at(&self, index: u64) -> Vector2D {
        if index % 4 == 1 {
            self.excursion
        } else {
            self.rest
        }
    }
}

impl SampleSource for TogglePattern {
    fn next_sample(&mut self) -> Option<PositionSample> {
        let index = self.frame;
        self.frame += 1;

        let position = self.position_at(index);
        let angle = angle_from_center(self.center, position);
        // sequence ids start at 1
        PositionSample::new(self.timebase.at(index), index + 1, position, angle, 1.0).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_period() {
        let mut src = TogglePattern::new(Vector2D::new(100.0, 100.0), Timebase::fixed_rate(60.0));
        let xs: Vec<f64> = (0..8)
            .map(|_| src.next_sample().unwrap().position().x)
            .collect();
        assert_eq!(xs, vec![150.0, 160.0, 150.0, 150.0, 150.0, 160.0, 150.0, 150.0]);
    }

    #[test]
    fn test_sample_fields() {
        let mut src = TogglePattern::new(Vector2D::new(100.0, 100.0), Timebase::fixed_rate(10.0));
        let _ = src.next_sample();
        let s = src.next_sample().unwrap();
        assert_eq!(s.sequence_id(), 2);
        assert!((s.timestamp() - 0.1).abs() < 1e-12);
        assert!((s.angular_position() - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert_eq!(s.confidence(), 1.0);
    }
}
