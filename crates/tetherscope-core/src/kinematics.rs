//! Finite-difference velocity and acceleration over the sample history.
//!
//! Velocity uses the two newest samples. Acceleration additionally needs a
//! third sample with a positive interval to the second; without it the
//! acceleration fields are zero and the frame is marked accordingly.
//! Intervals are signed: a zero or negative `dt` between the two newest
//! samples produces no frame at all.

use crate::angle::wrap_angle;
use crate::history::HistoryStore;
use crate::sample::{FrameSample, PositionSample};
use crate::vector::Vector2D;

/// Outcome of one `estimate()` call.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub enum Estimate {
    /// A frame was produced and appended to the output history.
    Ready(FrameSample),
    /// Fewer than two samples stored.
    InsufficientHistory { available: usize },
    /// The two newest samples are not strictly increasing in time.
    NonPositiveInterval { dt: f64 },
}

impl Estimate {
    pub fn frame(&self) -> Option<&FrameSample> {
        match self {
            Self::Ready(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn into_frame(self) -> Option<FrameSample> {
        match self {
            Self::Ready(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Linear and angular rate between two samples, `newer` after `older`.
struct Rate {
    linear: Vector2D,
    angular: f64,
}

impl Rate {
    fn between(newer: &PositionSample, older: &PositionSample, dt: f64) -> Self {
        Self {
            linear: (newer.position() - older.position()) / dt,
            angular: wrap_angle(newer.angular_position() - older.angular_position()) / dt,
        }
    }
}

pub struct DerivativeEstimator {
    history: HistoryStore,
    frames: Vec<FrameSample>,
}

impl Default for DerivativeEstimator {
    fn default() -> Self {
        Self::new(HistoryStore::default())
    }
}

impl DerivativeEstimator {
    pub fn new(history: HistoryStore) -> Self {
        Self {
            history,
            frames: Vec::new(),
        }
    }

    /// Bound sample history.
    pub fn store(&self) -> &HistoryStore {
        &self.history
    }

    pub fn store_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    /// Shorthand for `store_mut().store(sample)`.
    pub fn push(&mut self, sample: PositionSample) {
        self.history.store(sample);
    }

    pub fn estimate(&mut self) -> Estimate {
        let recent = self.history.recent(3);
        let (cur, prev) = match recent.as_slice() {
            [cur, prev, ..] => (cur, prev),
            _ => {
                return Estimate::InsufficientHistory {
                    available: recent.len(),
                }
            }
        };

        let dt_vel = cur.timestamp() - prev.timestamp();
        if dt_vel <= 0.0 || dt_vel.is_nan() {
            return Estimate::NonPositiveInterval { dt: dt_vel };
        }
        let rate = Rate::between(cur, prev, dt_vel);

        let mut acceleration = Vector2D::ZERO;
        let mut angular_acceleration = 0.0;
        let mut acceleration_available = false;

        if let Some(older) = recent.get(2) {
            let dt_prev = prev.timestamp() - older.timestamp();
            if dt_prev > 0.0 {
                let prev_rate = Rate::between(prev, older, dt_prev);
                let avg_dt = (dt_vel + dt_prev) / 2.0;
                acceleration = (rate.linear - prev_rate.linear) / avg_dt;
                angular_acceleration = (rate.angular - prev_rate.angular) / avg_dt;
                acceleration_available = true;
            }
        }

        let frame = FrameSample {
            timestamp: cur.timestamp(),
            sequence_id: cur.sequence_id(),
            position: cur.position(),
            velocity: rate.linear,
            acceleration,
            angular_position: cur.angular_position(),
            angular_velocity: rate.angular,
            angular_acceleration,
            confidence: cur.confidence(),
            quality: cur.quality(),
            acceleration_available,
        };
        self.frames.push(frame);
        Estimate::Ready(frame)
    }

    pub fn latest(&self) -> Option<&FrameSample> {
        self.frames.last()
    }

    /// Every emitted frame, oldest first.
    pub fn history(&self) -> &[FrameSample] {
        &self.frames
    }

    /// Drops emitted frames. The sample history is left alone.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn into_parts(self) -> (HistoryStore, Vec<FrameSample>) {
        (self.history, self.frames)
    }
}
