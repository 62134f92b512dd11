//! Sample ingestion for one reader: owns the ring, drives the detector and
//! keeps per-content-block progress counters.

use log::debug;

use crate::{
    buffer::{DEFAULT_SAMPLE_CAPACITY, SampleRing},
    detector::{DetectorConfig, DetectorSnapshot, ReturnSweepDetector, SweepEvent, SweepSink},
    layout::{LayoutError, LineLayout},
};

/// Reading-progress counters for the current content block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReadingProgress {
    pub total_lines: u16,
    pub sweeps: u16,
    pub last_completed_line: Option<u16>,
    velocity_sum: f32,
}

impl ReadingProgress {
    const fn for_lines(total_lines: u16) -> Self {
        Self {
            total_lines,
            sweeps: 0,
            last_completed_line: None,
            velocity_sum: 0.0,
        }
    }

    fn record(&mut self, event: &SweepEvent) {
        self.sweeps = self.sweeps.saturating_add(1);
        self.last_completed_line = Some(event.completed_line);
        self.velocity_sum += event.velocity;
    }

    /// Lines finished so far, counting every line up to the last completion.
    pub fn lines_completed(&self) -> u16 {
        self.last_completed_line.map_or(0, |line| line.saturating_add(1))
    }

    /// 0..=100
    pub fn progress_pct(&self) -> u8 {
        if self.total_lines == 0 {
            return 0;
        }

        let pct = self.lines_completed() as u32 * 100 / self.total_lines as u32;
        pct.min(100) as u8
    }

    /// Mean sweep velocity, `None` before the first sweep.
    pub fn mean_velocity(&self) -> Option<f32> {
        if self.sweeps == 0 {
            None
        } else {
            Some(self.velocity_sum / self.sweeps as f32)
        }
    }
}

/// Ingestion component: the single writer of the sample ring.
pub struct ReadingSession<const N: usize = DEFAULT_SAMPLE_CAPACITY> {
    samples: SampleRing<N>,
    detector: ReturnSweepDetector,
    progress: ReadingProgress,
}

impl<const N: usize> Default for ReadingSession<N> {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl<const N: usize> ReadingSession<N> {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            samples: SampleRing::new(),
            detector: ReturnSweepDetector::new(config),
            progress: ReadingProgress::default(),
        }
    }

    /// Locks line geometry for a new content block.
    ///
    /// An invalid layout leaves the session disarmed.
    pub fn begin_content(
        &mut self,
        line_centers: &[f32],
        half_height: f32,
        now_ms: f64,
    ) -> Result<(), LayoutError> {
        self.samples.clear();
        let layout = match LineLayout::new(line_centers, half_height) {
            Ok(layout) => layout,
            Err(err) => {
                debug!("session: layout rejected: {}", err);
                self.detector.reset();
                self.progress = ReadingProgress::default();
                return Err(err);
            }
        };

        self.progress = ReadingProgress::for_lines(layout.line_count());
        self.detector.lock(layout, now_ms);
        Ok(())
    }

    /// Ends the current content block; the session is disarmed until the
    /// next `begin_content`.
    pub fn end_content(&mut self) {
        self.samples.clear();
        self.detector.reset();
        self.progress = ReadingProgress::default();
    }

    /// Feeds one gaze sample through the whole pipeline.
    pub fn ingest<S>(&mut self, x: f32, y: f32, t: f64, sink: &mut S) -> Option<SweepEvent>
    where
        S: SweepSink + ?Sized,
    {
        self.samples.push(x, y, t);
        let event = self.detector.process(&self.samples, sink)?;
        self.progress.record(&event);
        Some(event)
    }

    pub fn progress(&self) -> ReadingProgress {
        self.progress
    }

    pub fn snapshot(&self) -> DetectorSnapshot {
        self.detector.snapshot()
    }

    pub fn samples(&self) -> &SampleRing<N> {
        &self.samples
    }
}

#[cfg(test)]
mod tests;
