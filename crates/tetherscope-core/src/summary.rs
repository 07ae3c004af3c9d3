use crate::sample::FrameSample;
use serde::Serialize;

/// Aggregate statistics over a run of emitted frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionSummary {
    pub frame_count: usize,
    /// Seconds between first and last frame.
    pub duration: f64,
    pub avg_speed: f64,
    pub max_speed: f64,
    pub avg_angular_velocity: f64,
    pub max_angular_velocity: f64,
}

impl SessionSummary {
    /// `None` for an empty slice.
    pub fn from_frames(frames: &[FrameSample]) -> Option<Self> {
        let (first, last) = (frames.first()?, frames.last()?);
        let n = frames.len() as f64;

        let speeds = frames.iter().map(FrameSample::speed);
        let omegas = frames.iter().map(|f| f.angular_velocity);

        Some(Self {
            frame_count: frames.len(),
            duration: last.timestamp - first.timestamp,
            avg_speed: speeds.clone().sum::<f64>() / n,
            max_speed: speeds.fold(f64::NEG_INFINITY, f64::max),
            avg_angular_velocity: omegas.clone().sum::<f64>() / n,
            max_angular_velocity: omegas.fold(f64::NEG_INFINITY, f64::max),
        })
    }
}
