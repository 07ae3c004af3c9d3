//! Command line arguments and their mapping onto library configs.

use anyhow::{Context, Result};
use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tetherscope_core::{RigGeometry, Vector2D, DEFAULT_CAPACITY};
use tetherscope_server::{LoopConfig, ServerConfig, SourceFactory};
use tetherscope_sim::{OrbitConfig, OrbitSource, SampleSource, Timebase, TogglePattern};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Two-point toggle used while developing the viewer
    Toggle,
    /// End mass circling the hub
    Orbit,
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Synthetic sample source
    #[arg(long, value_enum, default_value = "toggle")]
    pub source: SourceKind,

    // ── Rig geometry ─────────────────────────────────────────
    #[arg(long, default_value_t = 100.0)]
    pub center_x: f64,

    #[arg(long, default_value_t = 100.0)]
    pub center_y: f64,

    #[arg(long, default_value_t = 150.0)]
    pub tether_length: f64,

    #[arg(long, default_value_t = 20.0)]
    pub main_size: f64,

    #[arg(long, default_value_t = 12.0)]
    pub end_mass_radius: f64,

    // ── Orbit source ─────────────────────────────────────────
    /// rad/s
    #[arg(long, default_value_t = std::f64::consts::PI, allow_hyphen_values = true)]
    pub angular_rate: f64,

    /// Position noise std (image units)
    #[arg(long, default_value_t = 0.0)]
    pub jitter: f64,

    /// Probability that a cycle has no detection
    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl SourceArgs {
    pub fn geometry(&self) -> RigGeometry {
        RigGeometry {
            main_position: Vector2D::new(self.center_x, self.center_y),
            tether_length: self.tether_length,
            main_size: self.main_size,
            end_mass_radius: self.end_mass_radius,
        }
    }

    fn orbit_config(&self, seed: u64) -> OrbitConfig {
        OrbitConfig {
            center: Vector2D::new(self.center_x, self.center_y),
            radius: self.tether_length,
            angular_rate: self.angular_rate,
            jitter_std: self.jitter,
            dropout_probability: self.dropout,
            seed,
            ..OrbitConfig::default()
        }
    }

    pub fn build(&self, timebase: Timebase, seed: u64) -> Result<Box<dyn SampleSource + Send>> {
        let source: Box<dyn SampleSource + Send> = match self.source {
            SourceKind::Toggle => Box::new(TogglePattern::new(
                Vector2D::new(self.center_x, self.center_y),
                timebase,
            )),
            SourceKind::Orbit => Box::new(
                OrbitSource::new(self.orbit_config(seed), timebase)
                    .context("invalid orbit source settings")?,
            ),
        };
        Ok(source)
    }

    /// One wall-clock source per consumer. Settings are checked here so that
    /// building per connection cannot fail.
    pub fn factory(&self) -> Result<SourceFactory> {
        self.build(Timebase::Wall, self.seed)?;
        let args = self.clone();
        let factory: SourceFactory = Arc::new(move |consumer: u64| {
            let seed = args.seed.wrapping_add(consumer);
            match args.build(Timebase::Wall, seed) {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!(consumer, "falling back to toggle source: {:#}", e);
                    let center = args.geometry().main_position;
                    Box::new(TogglePattern::new(center, Timebase::Wall)) as Box<dyn SampleSource + Send>
                }
            }
        });
        Ok(factory)
    }
}

#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Directory served under /static
    #[arg(long, default_value = "viewer")]
    pub static_dir: PathBuf,

    #[arg(long, default_value_t = 60.0)]
    pub fps: f64,

    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub history: usize,

    /// Milliseconds a single write may take before the consumer is dropped
    #[arg(long, default_value_t = 1000)]
    pub write_timeout_ms: u64,

    #[command(flatten)]
    pub source: SourceArgs,
}

impl ServeArgs {
    pub fn server_config(&self) -> Result<ServerConfig> {
        let loop_config = LoopConfig {
            fps: self.fps,
            history_capacity: self.history,
            write_timeout: Duration::from_millis(self.write_timeout_ms),
            ..LoopConfig::default()
        };
        loop_config.validate().context("invalid serve settings")?;

        Ok(ServerConfig {
            host: self.host.clone(),
            port: self.port,
            static_dir: self.static_dir.clone(),
            loop_config,
            geometry: self.source.geometry(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Viewer payloads, one JSON object per line
    Json,
    /// Full frame records
    Csv,
}

#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Number of pipeline cycles
    #[arg(short = 'n', long, default_value_t = 300)]
    pub cycles: u64,

    /// Sample rate of the simulated timebase
    #[arg(long, default_value_t = 60.0)]
    pub fps: f64,

    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub history: usize,

    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub source: SourceArgs,
}

impl SimulateArgs {
    /// Loop settings the offline run shares with `serve`; validated the same way.
    pub fn loop_config(&self) -> Result<LoopConfig> {
        let config = LoopConfig {
            fps: self.fps,
            history_capacity: self.history,
            output_retention: None,
            ..LoopConfig::default()
        };
        config.validate().context("invalid simulate settings")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let args = ServeArgs::parse_from(["serve"]);
        let cfg = args.server_config().unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.loop_config.fps, 60.0);
        assert_eq!(cfg.loop_config.history_capacity, 100);
        assert_eq!(cfg.loop_config.write_timeout, Duration::from_secs(1));
        assert_eq!(cfg.geometry, RigGeometry::default());
        assert_eq!(args.source.source, SourceKind::Toggle);
    }

    #[test]
    fn test_orbit_settings_validated_up_front() {
        let args = ServeArgs::parse_from(["serve", "--source", "orbit", "--dropout", "2"]);
        assert!(args.source.factory().is_err());

        let args = ServeArgs::parse_from(["serve", "--source", "orbit", "--angular-rate", "-3"]);
        let factory = args.source.factory().unwrap();
        assert!(factory(1).next_sample().is_some());
    }

    #[test]
    fn test_serve_rejects_bad_rate_and_history() {
        let err = ServeArgs::parse_from(["serve", "--fps", "0"]).server_config().unwrap_err();
        assert!(format!("{err:#}").contains("fps"), "{err:#}");

        let err = ServeArgs::parse_from(["serve", "--fps=-5"]).server_config().unwrap_err();
        assert!(format!("{err:#}").contains("fps"), "{err:#}");

        let err = ServeArgs::parse_from(["serve", "--history", "0"]).server_config().unwrap_err();
        assert!(format!("{err:#}").contains("history"), "{err:#}");
    }

    #[test]
    fn test_simulate_rejects_bad_rate() {
        let args = SimulateArgs::parse_from(["simulate", "--fps", "0"]);
        assert!(args.loop_config().is_err());
        let args = SimulateArgs::parse_from(["simulate", "--history", "0"]);
        assert!(args.loop_config().is_err());
        let args = SimulateArgs::parse_from(["simulate", "-n", "3"]);
        assert_eq!(args.loop_config().unwrap().output_retention, None);
    }

    #[test]
    fn test_simulate_args() {
        let args = SimulateArgs::parse_from(["simulate", "-n", "10", "--format", "csv"]);
        assert_eq!(args.cycles, 10);
        assert_eq!(args.format, OutputFormat::Csv);
    }
}
