use std::time::{SystemTime, UNIX_EPOCH};
use tetherscope_core::PositionSample;

/// Anything that yields detector observations, one per pipeline cycle.
///
/// `None` means nothing was detected this cycle.
pub trait SampleSource {
    fn next_sample(&mut self) -> Option<PositionSample>;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn next_sample(&mut self) -> Option<PositionSample> {
        (**self).next_sample()
    }
}

/// Where sample timestamps come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timebase {
    /// Seconds since the UNIX epoch, read at sampling time.
    Wall,
    /// `start + index * step`, reproducible across runs.
    Fixed { start: f64, step: f64 },
}

impl Timebase {
    pub fn at(&self, index: u64) -> f64 {
        match *self {
            Self::Wall => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0),
            Self::Fixed { start, step } => start + index as f64 * step,
        }
    }

    /// Fixed timebase ticking at `fps` from zero.
    pub fn fixed_rate(fps: f64) -> Self {
        Self::Fixed {
            start: 0.0,
            step: 1.0 / fps,
        }
    }
}
