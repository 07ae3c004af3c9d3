//! One consumer's processing chain: source, history, estimator.

use tetherscope_core::{
    DerivativeEstimator, Estimate, FrameSample, HistoryError, HistoryStore, RigGeometry,
};
use tetherscope_sim::SampleSource;

/// What a single cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The source had nothing this cycle; history untouched.
    NoSample,
    /// A sample was stored but no frame could be derived yet.
    NotReady(Estimate),
    Frame(FrameSample),
}

pub struct Pipeline<S> {
    source: S,
    estimator: DerivativeEstimator,
    geometry: RigGeometry,
    output_retention: Option<usize>,
}

impl<S: SampleSource> Pipeline<S> {
    pub fn new(source: S, history_capacity: usize, geometry: RigGeometry) -> Result<Self, HistoryError> {
        Ok(Self {
            source,
            estimator: DerivativeEstimator::new(HistoryStore::new(history_capacity)?),
            geometry,
            output_retention: None,
        })
    }

    /// Clear the estimator's output history whenever it grows past `limit`
    /// frames. `None` (the default) keeps every frame.
    pub fn with_output_retention(mut self, limit: Option<usize>) -> Self {
        self.output_retention = limit;
        self
    }

    /// Pull one sample, store it, estimate.
    pub fn step(&mut self) -> Step {
        let Some(sample) = self.source.next_sample() else {
            return Step::NoSample;
        };
        self.estimator.push(sample);
        match self.estimator.estimate() {
            Estimate::Ready(frame) => {
                if self
                    .output_retention
                    .is_some_and(|limit| self.estimator.history().len() > limit)
                {
                    self.estimator.clear();
                }
                Step::Frame(frame)
            }
            other => Step::NotReady(other),
        }
    }

    pub fn geometry(&self) -> &RigGeometry {
        &self.geometry
    }

    pub fn estimator(&self) -> &DerivativeEstimator {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut DerivativeEstimator {
        &mut self.estimator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tetherscope_core::{PositionSample, Vector2D};

    /// Replays a fixed script of detections.
    struct Script(std::vec::IntoIter<Option<PositionSample>>);

    impl SampleSource for Script {
        fn next_sample(&mut self) -> Option<PositionSample> {
            self.0.next().flatten()
        }
    }

    fn s(t: f64, x: f64) -> Option<PositionSample> {
        Some(PositionSample::new(t, 0, Vector2D::new(x, 0.0), 0.0, 1.0).unwrap())
    }

    #[test]
    fn test_step_sequence() {
        let script = vec![s(0.0, 0.0), None, s(1.0, 10.0), s(0.5, 3.0), s(2.0, 25.0)];
        let mut p = Pipeline::new(Script(script.into_iter()), 10, RigGeometry::default()).unwrap();

        assert_eq!(
            p.step(),
            Step::NotReady(Estimate::InsufficientHistory { available: 1 })
        );
        assert_eq!(p.step(), Step::NoSample);
        assert_eq!(p.estimator().store().len(), 1);

        match p.step() {
            Step::Frame(f) => assert!((f.velocity.x - 10.0).abs() < 1e-9),
            other => panic!("expected frame, got {other:?}"),
        }
        assert!(matches!(
            p.step(),
            Step::NotReady(Estimate::NonPositiveInterval { .. })
        ));
        assert!(matches!(p.step(), Step::Frame(_)));
        assert_eq!(p.estimator().history().len(), 2);
    }

    #[test]
    fn test_output_retention_bounds_history() {
        let script = (0..500).map(|i| s(i as f64, i as f64 * 2.0)).collect::<Vec<_>>();
        let mut p = Pipeline::new(Script(script.into_iter()), 10, RigGeometry::default())
            .unwrap()
            .with_output_retention(Some(50));

        let mut frames = 0;
        for _ in 0..500 {
            if let Step::Frame(f) = p.step() {
                frames += 1;
                // clearing output leaves the sample history, so velocity keeps flowing
                assert!((f.velocity.x - 2.0).abs() < 1e-9);
            }
            assert!(p.estimator().history().len() <= 50);
        }
        assert_eq!(frames, 499);
        assert_eq!(p.estimator().store().len(), 10);
    }

    #[test]
    fn test_no_retention_keeps_everything() {
        let script = (0..200).map(|i| s(i as f64, 0.0)).collect::<Vec<_>>();
        let mut p = Pipeline::new(Script(script.into_iter()), 10, RigGeometry::default()).unwrap();
        for _ in 0..200 {
            p.step();
        }
        assert_eq!(p.estimator().history().len(), 199);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let p = Pipeline::new(Script(Vec::new().into_iter()), 0, RigGeometry::default());
        assert!(p.is_err());
    }
}
