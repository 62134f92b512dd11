//! Replays a recorded gaze trace through the return-sweep detector.
//!
//! Prints one line per detected sweep followed by a reading-progress summary.
//! Set `RUST_LOG=sweepline_core=debug` to see gate decisions on stderr.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use sweepline_core::{DEFAULT_SAMPLE_CAPACITY, DetectorConfig, ReadingSession, SweepEvent};
use tracing::{info, warn};

#[path = "main/report.rs"]
mod report;
#[path = "main/trace.rs"]
mod trace;

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Replay a gaze trace through the return-sweep detector")]
struct Cli {
    /// CSV trace with `x,y,t` rows (t in milliseconds).
    trace: PathBuf,

    /// Comma-separated line center-Y values, top to bottom.
    #[arg(long)]
    layout: String,

    /// Hit-test tolerance around each line center.
    #[arg(long, default_value_t = 15.0)]
    half_height: f32,

    /// Content-start timestamp (defaults to the first sample).
    #[arg(long)]
    lock_at: Option<f64>,

    /// Valley depth in position units per ms.
    #[arg(long, default_value_t = -0.4, allow_hyphen_values = true)]
    depth_threshold: f32,

    /// Minimum spacing between sweeps.
    #[arg(long, default_value_t = 500.0)]
    cooldown_ms: f64,

    /// Maximum peak/valley separation.
    #[arg(long, default_value_t = 600.0)]
    cascade_window_ms: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr) // stdout carries the report
        .init();

    let cli = Cli::parse();

    let centers = trace::parse_centers(&cli.layout)?;
    let text = fs::read_to_string(&cli.trace)
        .with_context(|| format!("reading {}", cli.trace.display()))?;
    let samples = trace::parse_trace(&text)
        .with_context(|| format!("parsing {}", cli.trace.display()))?;
    let Some(first) = samples.first() else {
        bail!("{} contains no samples", cli.trace.display());
    };

    let config = DetectorConfig {
        depth_threshold: cli.depth_threshold,
        cooldown_ms: cli.cooldown_ms,
        cascade_window_ms: cli.cascade_window_ms,
    };
    if config.sanitized() != config {
        warn!(
            requested = ?config,
            effective = ?config.sanitized(),
            "out-of-range detector settings replaced with defaults"
        );
    }

    let mut session = Box::new(ReadingSession::<DEFAULT_SAMPLE_CAPACITY>::new(config));
    session
        .begin_content(&centers, cli.half_height, cli.lock_at.unwrap_or(first.t))
        .map_err(|err| anyhow!("invalid layout: {err}"))?;
    info!(
        lines = centers.len(),
        samples = samples.len(),
        "replaying {}",
        cli.trace.display()
    );

    let mut out = io::stdout().lock();
    let mut written = Ok(());
    let mut print_sweep = |event: SweepEvent| {
        if written.is_ok() {
            written = report::write_event(&mut out, &event);
        }
    };
    for sample in &samples {
        let _ = session.ingest(sample.x, sample.y, sample.t, &mut print_sweep);
    }
    written?;

    report::write_summary(
        &mut out,
        samples.len(),
        &session.progress(),
        &session.snapshot(),
    )?;
    out.flush()?;
    Ok(())
}
