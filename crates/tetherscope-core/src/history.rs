//! Fixed-capacity ring of recent position samples.

use crate::sample::PositionSample;
use serde::Serialize;
use std::collections::VecDeque;
use thiserror::Error;

/// About three seconds of history at 30 fps.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("history capacity must be at least 1")]
    ZeroCapacity,
}

/// Snapshot of the buffer state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryStats {
    pub size: usize,
    pub capacity: usize,
    pub oldest_timestamp: Option<f64>,
    pub newest_timestamp: Option<f64>,
}

/// Insertion-ordered ring buffer. The oldest sample is evicted when a store
/// would exceed capacity.
///
/// Order is arrival order; timestamps are not checked for monotonicity here.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    samples: VecDeque<PositionSample>,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self {
            samples: VecDeque::with_capacity(DEFAULT_CAPACITY),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Result<Self, HistoryError> {
        if capacity == 0 {
            return Err(HistoryError::ZeroCapacity);
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn store(&mut self, sample: PositionSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Up to `n` most recent samples, newest first.
    pub fn recent(&self, n: usize) -> Vec<PositionSample> {
        self.samples.iter().rev().take(n).copied().collect()
    }

    /// Sample with the timestamp closest to `target`. Earliest stored wins a tie.
    pub fn nearest(&self, target: f64) -> Option<&PositionSample> {
        let mut best: Option<(&PositionSample, f64)> = None;
        for s in &self.samples {
            let d = (s.timestamp() - target).abs();
            match best {
                Some((_, bd)) if d >= bd => {}
                _ => best = Some((s, d)),
            }
        }
        best.map(|(s, _)| s)
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            size: self.samples.len(),
            capacity: self.capacity,
            oldest_timestamp: self.samples.front().map(|s| s.timestamp()),
            newest_timestamp: self.samples.back().map(|s| s.timestamp()),
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PositionSample> {
        self.samples.iter()
    }
}
