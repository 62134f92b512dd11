//! Horizontal smoothing, velocity and turning-point detection.
//!
//! Only the newest three samples are read from the ring on each step; the few
//! values that must outlive a step are kept as scalars.

use crate::buffer::{Sample, SampleRing};

/// 3-tap low-pass weights for `(x(t), x(t-1), x(t-2))`, newest first.
pub const SMOOTHING_WEIGHTS: [f32; 3] = [0.5, 0.3, 0.2];

/// Result of one estimator step. Turning points are reported at `t-1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionStep {
    /// Timestamp of the newest sample.
    pub now: f64,
    /// Timestamp of the middle sample, where any turning point sits.
    pub pivot_time: f64,
    pub smoothed_x: f32,
    /// `v(t)` in position units per millisecond.
    pub velocity: f32,
    /// `v(t-1)`, the velocity at the pivot.
    pub pivot_velocity: f32,
    /// End of forward reading motion at the pivot.
    pub peak: bool,
    /// Sharp leftward snap at the pivot, deeper than the configured threshold.
    pub valley: bool,
}

/// Rolling smoother and turning-point detector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionEstimator {
    /// `sx(t-1)` as seen by the next step.
    smoothed_prev: Option<f32>,
    /// `sx(t-2)` as seen by the next step.
    smoothed_prev2: Option<f32>,
    /// `v(t-2)` as seen by the next step.
    velocity_prev2: Option<f32>,
}

impl MotionEstimator {
    pub const fn new() -> Self {
        Self {
            smoothed_prev: None,
            smoothed_prev2: None,
            velocity_prev2: None,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Cached `(sx(t-1), sx(t-2))` for the next step.
    pub const fn smoothed_history(&self) -> (Option<f32>, Option<f32>) {
        (self.smoothed_prev, self.smoothed_prev2)
    }

    /// Cached `v(t-2)` for the next step.
    pub const fn velocity_history(&self) -> Option<f32> {
        self.velocity_prev2
    }

    /// Advances the estimator by the newest ring sample.
    ///
    /// Returns `None` without touching any state while fewer than three
    /// samples are buffered. Comparisons against caches that are not yet
    /// filled never match.
    pub fn step<const N: usize>(
        &mut self,
        ring: &SampleRing<N>,
        depth_threshold: f32,
    ) -> Option<MotionStep> {
        let newest = ring.sample_at(0)?;
        let middle = ring.sample_at(1)?;
        let oldest = ring.sample_at(2)?;

        let [w0, w1, w2] = SMOOTHING_WEIGHTS;
        let smoothed_x = w0 * newest.x + w1 * middle.x + w2 * oldest.x;
        let velocity = velocity_between(middle, newest);
        let pivot_velocity = velocity_between(oldest, middle);

        let plateau_peak = match (self.smoothed_prev, self.smoothed_prev2) {
            (Some(prev), Some(prev2)) => prev >= prev2 && prev > smoothed_x,
            _ => false,
        };
        let turning_peak = pivot_velocity >= 0.0 && velocity < 0.0;

        let valley = match self.velocity_prev2 {
            Some(before) => {
                before > pivot_velocity
                    && pivot_velocity < velocity
                    && pivot_velocity < depth_threshold
            }
            None => false,
        };

        self.smoothed_prev2 = self.smoothed_prev;
        self.smoothed_prev = Some(smoothed_x);
        self.velocity_prev2 = Some(pivot_velocity);

        Some(MotionStep {
            now: newest.t,
            pivot_time: middle.t,
            smoothed_x,
            velocity,
            pivot_velocity,
            peak: plateau_peak || turning_peak,
            valley,
        })
    }
}

/// Horizontal velocity from `from` to `to`; zero for non-increasing or
/// non-finite timestamps and for non-finite positions.
fn velocity_between(from: Sample, to: Sample) -> f32 {
    let dt = to.t - from.t;
    if !dt.is_finite() || dt <= 0.0 {
        return 0.0;
    }

    let velocity = (to.x - from.x) / dt as f32;
    if velocity.is_finite() { velocity } else { 0.0 }
}
