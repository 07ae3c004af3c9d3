//! Offline run: drive one pipeline as fast as possible against a synthetic
//! source on a fixed timebase and print what a viewer would have received.

use crate::cli::{OutputFormat, SimulateArgs};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use tetherscope_core::{FrameSample, SessionSummary};
use tetherscope_server::{Pipeline, Step, TelemetryPayload};
use tetherscope_sim::Timebase;

/// Flat CSV row for one frame.
#[derive(Debug, Serialize)]
struct FrameRow {
    timestamp: f64,
    sequence_id: u64,
    pos_x: f64,
    pos_y: f64,
    vel_x: f64,
    vel_y: f64,
    acc_x: f64,
    acc_y: f64,
    angle: f64,
    angular_velocity: f64,
    angular_acceleration: f64,
    confidence: f64,
    quality: &'static str,
    acceleration_available: bool,
}

impl From<&FrameSample> for FrameRow {
    fn from(f: &FrameSample) -> Self {
        Self {
            timestamp: f.timestamp,
            sequence_id: f.sequence_id,
            pos_x: f.position.x,
            pos_y: f.position.y,
            vel_x: f.velocity.x,
            vel_y: f.velocity.y,
            acc_x: f.acceleration.x,
            acc_y: f.acceleration.y,
            angle: f.angular_position,
            angular_velocity: f.angular_velocity,
            angular_acceleration: f.angular_acceleration,
            confidence: f.confidence,
            quality: f.quality.map(|q| q.label()).unwrap_or(""),
            acceleration_available: f.acceleration_available,
        }
    }
}

pub fn run(args: &SimulateArgs) -> Result<()> {
    let summary = {
        let stdout = std::io::stdout();
        simulate_into(args, stdout.lock())?
    };

    match summary {
        Some(s) => tracing::info!(
            frames = s.frame_count,
            duration = s.duration,
            avg_speed = s.avg_speed,
            max_speed = s.max_speed,
            avg_angular_velocity = s.avg_angular_velocity,
            max_angular_velocity = s.max_angular_velocity,
            "simulation complete"
        ),
        None => tracing::info!(cycles = args.cycles, "simulation produced no frames"),
    }
    Ok(())
}

/// Writes telemetry for `args.cycles` cycles to `out`.
fn simulate_into<W: Write>(args: &SimulateArgs, mut out: W) -> Result<Option<SessionSummary>> {
    let config = args.loop_config()?;
    let source = args.source.build(Timebase::fixed_rate(config.fps), args.source.seed)?;
    let mut pipeline = Pipeline::new(source, config.history_capacity, args.source.geometry())
        .context("cannot build pipeline")?;

    for _ in 0..args.cycles {
        if let Step::NotReady(estimate) = pipeline.step() {
            tracing::debug!(?estimate, "no frame this cycle");
        }
    }

    let frames = pipeline.estimator().history();
    match args.format {
        OutputFormat::Csv => {
            let mut w = csv::Writer::from_writer(&mut out);
            for frame in frames {
                w.serialize(FrameRow::from(frame))?;
            }
            w.flush()?;
        }
        OutputFormat::Json => {
            for frame in frames {
                let payload = TelemetryPayload::from_frame(frame, pipeline.geometry());
                writeln!(out, "{}", payload.to_json()?)?;
            }
        }
    }
    out.flush()?;

    Ok(SessionSummary::from_frames(frames))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run_to_string(argv: &[&str]) -> (String, Option<SessionSummary>) {
        let args = SimulateArgs::parse_from(argv);
        let mut buf = Vec::new();
        let summary = simulate_into(&args, &mut buf).unwrap();
        (String::from_utf8(buf).unwrap(), summary)
    }

    #[test]
    fn test_json_lines() {
        let (out, summary) = run_to_string(&["simulate", "-n", "8"]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 7);
        for line in lines {
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(v["timestamp"].is_i64());
            assert_eq!(v["tetherLength"], 150.0);
        }
        assert_eq!(summary.unwrap().frame_count, 7);
    }

    #[test]
    fn test_csv_rows() {
        let (out, summary) = run_to_string(&[
            "simulate", "-n", "5", "--format", "csv", "--source", "orbit",
        ]);
        let mut lines = out.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("timestamp,sequence_id,pos_x"));
        let rows: Vec<&str> = lines.collect();
        assert_eq!(rows.len(), 4);
        // only the first frame lacks acceleration
        assert!(rows[0].ends_with(",false"));
        assert!(rows[3].ends_with(",true"));

        // constant π rad/s orbit
        let s = summary.unwrap();
        assert!((s.avg_angular_velocity - std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_zero_fps_is_an_error() {
        let args = SimulateArgs::parse_from(["simulate", "--fps", "0"]);
        let mut buf = Vec::new();
        let err = simulate_into(&args, &mut buf).unwrap_err();
        assert!(format!("{err:#}").contains("fps"), "{err:#}");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_all_dropouts_yield_nothing() {
        let (out, summary) = run_to_string(&[
            "simulate", "-n", "20", "--source", "orbit", "--dropout", "1",
        ]);
        assert!(out.is_empty());
        assert!(summary.is_none());
    }
}
