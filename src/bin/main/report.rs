use std::io::{self, Write};

use sweepline_core::{DetectorSnapshot, ReadingProgress, SweepEvent};

pub(super) fn write_event(out: &mut impl Write, event: &SweepEvent) -> io::Result<()> {
    writeln!(
        out,
        "sweep t={:.1}ms completed_line={} velocity={:.3}",
        event.at_ms, event.completed_line, event.velocity
    )
}

pub(super) fn write_summary(
    out: &mut impl Write,
    samples: usize,
    progress: &ReadingProgress,
    snapshot: &DetectorSnapshot,
) -> io::Result<()> {
    writeln!(out, "samples: {samples}")?;
    writeln!(out, "sweeps: {}", progress.sweeps)?;
    writeln!(
        out,
        "lines completed: {}/{} ({}%)",
        progress.lines_completed(),
        progress.total_lines,
        progress.progress_pct()
    )?;
    match progress.mean_velocity() {
        Some(velocity) => writeln!(out, "mean sweep velocity: {velocity:.3}")?,
        None => writeln!(out, "mean sweep velocity: -")?,
    }
    match snapshot.current_line {
        Some(line) => writeln!(out, "final line: {line}")?,
        None => writeln!(out, "final line: unknown")?,
    }
    if let Some(verdict) = snapshot.last_verdict {
        writeln!(out, "last gate verdict: {}", verdict.label())?;
    }
    Ok(())
}
