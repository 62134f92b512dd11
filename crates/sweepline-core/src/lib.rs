#![cfg_attr(not(test), no_std)]

//! Streaming return-sweep detection over a gaze sample feed.
//!
//! Everything here runs inside the per-sample callback: no allocation, no
//! layout re-measurement, and O(lines) work per sample at most.

pub mod buffer;
pub mod detector;
pub mod layout;
pub mod motion;
pub mod session;

pub use buffer::{DEFAULT_SAMPLE_CAPACITY, Sample, SampleRing};
pub use detector::{
    DetectorConfig, DetectorSnapshot, GateVerdict, ReturnSweepDetector, SweepEvent, SweepSink,
};
pub use layout::{LayoutError, LineLayout, LineLocator, MAX_LAYOUT_LINES};
pub use motion::{MotionEstimator, MotionStep};
pub use session::{ReadingProgress, ReadingSession};
