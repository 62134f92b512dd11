//! Cascade gate over peak/valley turning points and the sweep trigger.

use log::{debug, trace};

use crate::{
    buffer::SampleRing,
    layout::{LineLayout, LineLocator},
    motion::{MotionEstimator, MotionStep},
};

/// Tunable thresholds for the sweep gate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Pivot velocity must fall below this (position units per ms, negative).
    pub depth_threshold: f32,
    /// Minimum spacing between two fired sweeps.
    pub cooldown_ms: f64,
    /// Maximum peak/valley separation for one sweep.
    pub cascade_window_ms: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            depth_threshold: -0.4,
            cooldown_ms: 500.0,
            cascade_window_ms: 600.0,
        }
    }
}

impl DetectorConfig {
    /// Replaces out-of-range fields with their defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            depth_threshold: if self.depth_threshold.is_finite() && self.depth_threshold < 0.0 {
                self.depth_threshold
            } else {
                defaults.depth_threshold
            },
            cooldown_ms: if self.cooldown_ms.is_finite() && self.cooldown_ms >= 0.0 {
                self.cooldown_ms
            } else {
                defaults.cooldown_ms
            },
            cascade_window_ms: if self.cascade_window_ms.is_finite()
                && self.cascade_window_ms >= 0.0
            {
                self.cascade_window_ms
            } else {
                defaults.cascade_window_ms
            },
        }
    }
}

/// A confirmed return sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepEvent {
    /// Line the reader just finished, one above the line now being read.
    pub completed_line: u16,
    /// Pivot velocity of the leftward snap; always negative.
    pub velocity: f32,
    /// Timestamp of the sample that confirmed the sweep.
    pub at_ms: f64,
}

/// Receiver for fired sweeps, invoked synchronously from `process`.
pub trait SweepSink {
    fn on_sweep(&mut self, event: SweepEvent);
}

impl<F> SweepSink for F
where
    F: FnMut(SweepEvent),
{
    fn on_sweep(&mut self, event: SweepEvent) {
        (*self)(event)
    }
}

/// Outcome of the most recent valley evaluation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GateVerdict {
    Fired,
    /// No content locked yet, or the sample predates the lock.
    BeforeContent,
    Cooldown,
    /// No peak close enough to the valley.
    OutsideCascade,
    LineUnknown,
    FirstLine,
    /// Current line is not past the highest line already reported.
    NotAdvanced,
}

impl GateVerdict {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fired => "fired",
            Self::BeforeContent => "before-content",
            Self::Cooldown => "cooldown",
            Self::OutsideCascade => "outside-cascade",
            Self::LineUnknown => "line-unknown",
            Self::FirstLine => "first-line",
            Self::NotAdvanced => "not-advanced",
        }
    }
}

/// Read-only view of detector state for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorSnapshot {
    pub armed: bool,
    pub line_count: u16,
    pub current_line: Option<u16>,
    pub max_line_reached: Option<u16>,
    pub content_start_ms: Option<f64>,
    pub last_peak_ms: Option<f64>,
    pub last_trigger_ms: Option<f64>,
    pub smoothed_prev: Option<f32>,
    pub smoothed_prev2: Option<f32>,
    pub velocity_prev2: Option<f32>,
    pub last_verdict: Option<GateVerdict>,
}

/// Peak/valley separation check. Either order counts: a valley may land
/// slightly before its peak.
fn within_cascade(valley_ms: f64, peak_ms: f64, window_ms: f64) -> bool {
    let gap = valley_ms - peak_ms;
    gap < window_ms && -gap < window_ms
}

/// Streaming return-sweep detector.
///
/// Disarmed until a layout is locked. Every field is a scalar or the locked
/// layout table, so per-sample work never allocates.
#[derive(Clone, Debug)]
pub struct ReturnSweepDetector {
    config: DetectorConfig,
    layout: Option<LineLayout>,
    locator: LineLocator,
    motion: MotionEstimator,
    content_start_ms: Option<f64>,
    last_peak_ms: Option<f64>,
    last_trigger_ms: Option<f64>,
    max_line_reached: Option<u16>,
    last_verdict: Option<GateVerdict>,
}

impl Default for ReturnSweepDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl ReturnSweepDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config: config.sanitized(),
            layout: None,
            locator: LineLocator::new(),
            motion: MotionEstimator::new(),
            content_start_ms: None,
            last_peak_ms: None,
            last_trigger_ms: None,
            max_line_reached: None,
            last_verdict: None,
        }
    }

    pub fn config(&self) -> DetectorConfig {
        self.config
    }

    pub fn is_armed(&self) -> bool {
        self.layout.is_some()
    }

    /// Installs the layout for a new content block and clears all history.
    pub fn lock(&mut self, layout: LineLayout, now_ms: f64) {
        self.reset();
        debug!(
            "sweep: layout locked lines={} half_height={} at={}",
            layout.line_count(),
            layout.half_height(),
            now_ms
        );
        self.layout = Some(layout);
        self.content_start_ms = Some(now_ms);
    }

    /// Drops the layout and every piece of detection state.
    pub fn reset(&mut self) {
        if self.layout.is_some() {
            debug!("sweep: detector reset");
        }
        self.layout = None;
        self.locator.clear();
        self.motion.clear();
        self.content_start_ms = None;
        self.last_peak_ms = None;
        self.last_trigger_ms = None;
        self.max_line_reached = None;
        self.last_verdict = None;
    }

    /// Evaluates the newest sample in `ring`, calling `sink` if it confirms a
    /// return sweep. The ring is only read at its three newest positions.
    pub fn process<const N: usize, S>(
        &mut self,
        ring: &SampleRing<N>,
        sink: &mut S,
    ) -> Option<SweepEvent>
    where
        S: SweepSink + ?Sized,
    {
        let newest = ring.newest()?;
        self.locator.locate(self.layout.as_ref(), newest.y);

        let step = self.motion.step(ring, self.config.depth_threshold)?;
        if step.peak && step.pivot_time.is_finite() {
            self.last_peak_ms = Some(step.pivot_time);
        }
        if !step.valley {
            return None;
        }

        let verdict = self.evaluate_gate(&step);
        self.last_verdict = Some(verdict);
        if verdict != GateVerdict::Fired {
            trace!(
                "sweep: valley at {} v={} rejected ({})",
                step.pivot_time,
                step.pivot_velocity,
                verdict.label()
            );
            return None;
        }

        // evaluate_gate only passes with a known line above the first one.
        let line = self.locator.current()?;
        self.last_trigger_ms = Some(step.now);
        self.max_line_reached = Some(line);
        self.last_peak_ms = None;

        let event = SweepEvent {
            completed_line: line - 1,
            velocity: step.pivot_velocity,
            at_ms: step.now,
        };
        debug!(
            "sweep: line {} completed v={} at={}",
            event.completed_line, event.velocity, event.at_ms
        );
        sink.on_sweep(event);
        Some(event)
    }

    fn evaluate_gate(&self, step: &MotionStep) -> GateVerdict {
        let Some(content_start) = self.content_start_ms else {
            return GateVerdict::BeforeContent;
        };
        // Fails closed on a non-finite timestamp or content start.
        if !(step.now.is_finite() && content_start.is_finite()) || step.now < content_start {
            return GateVerdict::BeforeContent;
        }

        if let Some(last_trigger) = self.last_trigger_ms
            && step.now - last_trigger < self.config.cooldown_ms
        {
            return GateVerdict::Cooldown;
        }

        let paired = self.last_peak_ms.is_some_and(|peak| {
            within_cascade(step.pivot_time, peak, self.config.cascade_window_ms)
        });
        if !paired {
            return GateVerdict::OutsideCascade;
        }

        let Some(line) = self.locator.current() else {
            return GateVerdict::LineUnknown;
        };
        if line == 0 {
            return GateVerdict::FirstLine;
        }
        if self.max_line_reached.is_some_and(|max| line <= max) {
            return GateVerdict::NotAdvanced;
        }

        GateVerdict::Fired
    }

    pub fn snapshot(&self) -> DetectorSnapshot {
        let (smoothed_prev, smoothed_prev2) = self.motion.smoothed_history();
        DetectorSnapshot {
            armed: self.is_armed(),
            line_count: self.layout.as_ref().map_or(0, LineLayout::line_count),
            current_line: self.locator.current(),
            max_line_reached: self.max_line_reached,
            content_start_ms: self.content_start_ms,
            last_peak_ms: self.last_peak_ms,
            last_trigger_ms: self.last_trigger_ms,
            smoothed_prev,
            smoothed_prev2,
            velocity_prev2: self.motion.velocity_history(),
            last_verdict: self.last_verdict,
        }
    }
}
