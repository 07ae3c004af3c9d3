//! Fixed-rate driver for one consumer's pipeline.
//!
//! Each cycle pulls a sample, estimates, and writes at most one payload. The
//! remainder of the period is slept off; a cycle that overruns starts the
//! next one immediately without trying to catch up. The sleep is the only
//! suspension point besides the bounded write and is interrupted by the
//! consumer going away or a server shutdown.

use crate::config::{ConfigError, LoopConfig};
use crate::payload::TelemetryPayload;
use crate::pipeline::{Pipeline, Step};
use crate::transport::{Transport, TransportError};
use std::time::Duration;
use tetherscope_sim::SampleSource;
use tokio::sync::watch;
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// State & outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Init,
    Running,
    TransportFailed,
    Cancelled,
    Terminated,
}

impl LoopState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Running => "running",
            Self::TransportFailed => "transport_failed",
            Self::Cancelled => "cancelled",
            Self::Terminated => "terminated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Consumer went away while the loop was idle.
    Disconnected,
    /// Server-wide shutdown.
    Shutdown,
    /// `LoopConfig::max_cycles` reached.
    CycleLimit,
}

#[derive(Debug)]
pub enum LoopExit {
    TransportFailed(TransportError),
    Cancelled(CancelReason),
}

#[derive(Debug)]
pub struct LoopReport {
    pub exit: LoopExit,
    pub cycles: u64,
    pub emitted: u64,
    /// Cycles where the source returned nothing.
    pub empty_cycles: u64,
    /// Cycles where a sample was stored but no frame came out.
    pub not_ready: u64,
    /// Cycles that took longer than the target interval.
    pub overruns: u64,
    /// Always `Terminated` once `run` returns.
    pub state: LoopState,
}

// ---------------------------------------------------------------------------
// Shutdown signal
// ---------------------------------------------------------------------------

/// Server-wide stop flag observed by every running loop.
#[derive(Clone, Default)]
pub struct Shutdown {
    rx: Option<watch::Receiver<bool>>,
}

impl Shutdown {
    /// Never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }

    pub fn is_triggered(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once the flag is set. A dropped sender can no longer set it,
    /// so this then stays pending.
    pub async fn wait(&mut self) {
        if let Some(rx) = self.rx.as_mut() {
            let fired = rx.wait_for(|stop| *stop).await.is_ok();
            if fired {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

/// Time left in the period, or `None` when the cycle used all of it.
pub fn pacing_delay(interval: Duration, elapsed: Duration) -> Option<Duration> {
    interval.checked_sub(elapsed).filter(|d| !d.is_zero())
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Single-use: `run` consumes the loop, so a terminated loop cannot restart.
pub struct CadenceLoop {
    config: LoopConfig,
    state: LoopState,
}

impl CadenceLoop {
    pub fn new(config: LoopConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: LoopState::Init,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    fn transition(&mut self, next: LoopState) {
        tracing::debug!(from = self.state.label(), to = next.label(), "cadence loop state");
        self.state = next;
    }

    /// Runs until the transport fails, the consumer disconnects, shutdown is
    /// signalled, or the configured cycle limit is reached.
    pub async fn run<S, T>(
        mut self,
        pipeline: &mut Pipeline<S>,
        transport: &mut T,
        mut shutdown: Shutdown,
    ) -> LoopReport
    where
        S: SampleSource + Send,
        T: Transport,
    {
        let interval = self.config.interval();
        let mut cycles = 0u64;
        let mut emitted = 0u64;
        let mut empty_cycles = 0u64;
        let mut not_ready = 0u64;
        let mut overruns = 0u64;

        self.transition(LoopState::Running);

        let exit = loop {
            if shutdown.is_triggered() {
                break LoopExit::Cancelled(CancelReason::Shutdown);
            }
            if self.config.max_cycles.is_some_and(|max| cycles >= max) {
                break LoopExit::Cancelled(CancelReason::CycleLimit);
            }

            let start = Instant::now();
            cycles += 1;

            match pipeline.step() {
                Step::NoSample => empty_cycles += 1,
                Step::NotReady(estimate) => {
                    tracing::trace!(?estimate, "no frame this cycle");
                    not_ready += 1;
                }
                Step::Frame(frame) => {
                    match TelemetryPayload::from_frame(&frame, pipeline.geometry()).to_json() {
                        Ok(json) => {
                            let timeout = self.config.write_timeout;
                            match tokio::time::timeout(timeout, transport.send(json)).await {
                                Ok(Ok(())) => emitted += 1,
                                Ok(Err(e)) => break LoopExit::TransportFailed(e),
                                Err(_) => break LoopExit::TransportFailed(TransportError::Timeout(timeout)),
                            }
                        }
                        Err(e) => {
                            tracing::warn!(seq = frame.sequence_id, "failed to encode frame: {}", e);
                        }
                    }
                }
            }

            match pacing_delay(interval, start.elapsed()) {
                Some(remaining) => {
                    tokio::select! {
                        _ = tokio::time::sleep(remaining) => {}
                        _ = transport.closed() => break LoopExit::Cancelled(CancelReason::Disconnected),
                        _ = shutdown.wait() => break LoopExit::Cancelled(CancelReason::Shutdown),
                    }
                }
                None => overruns += 1,
            }
        };

        match &exit {
            LoopExit::TransportFailed(e) => {
                tracing::warn!(cycles, emitted, "telemetry write failed: {}", e);
                self.transition(LoopState::TransportFailed);
            }
            LoopExit::Cancelled(reason) => {
                tracing::info!(cycles, emitted, ?reason, "telemetry loop cancelled");
                self.transition(LoopState::Cancelled);
            }
        }
        self.transition(LoopState::Terminated);

        LoopReport {
            exit,
            cycles,
            emitted,
            empty_cycles,
            not_ready,
            overruns,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pacing_delay() {
        let t = Duration::from_millis(16);
        assert_eq!(pacing_delay(t, Duration::from_millis(4)), Some(Duration::from_millis(12)));
        assert_eq!(pacing_delay(t, t), None);
        assert_eq!(pacing_delay(t, Duration::from_millis(40)), None);
        assert_eq!(pacing_delay(t, Duration::ZERO), Some(t));
    }

    #[tokio::test]
    async fn test_shutdown_flag() {
        let (tx, rx) = watch::channel(false);
        let mut shutdown = Shutdown::new(rx);
        assert!(!shutdown.is_triggered());
        tx.send(true).unwrap();
        assert!(shutdown.is_triggered());
        shutdown.wait().await;

        assert!(!Shutdown::never().is_triggered());
    }

    #[test]
    fn test_state_labels() {
        let lp = CadenceLoop::new(LoopConfig::default()).unwrap();
        assert_eq!(lp.state(), LoopState::Init);
        assert_eq!(LoopState::TransportFailed.label(), "transport_failed");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = LoopConfig {
            fps: 0.0,
            ..LoopConfig::default()
        };
        assert!(matches!(CadenceLoop::new(cfg), Err(ConfigError::InvalidFps(_))));
    }
}
