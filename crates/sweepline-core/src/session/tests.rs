use super::*;
use crate::detector::GateVerdict;

const FRAME_MS: f64 = 33.0;
const LINES: [f32; 3] = [100.0, 140.0, 180.0];
const HALF_HEIGHT: f32 = 15.0;

/// Gaze trace built frame by frame at the nominal 30 Hz spacing.
struct GazeScript {
    samples: Vec<(f32, f32, f64)>,
    t: f64,
}

impl GazeScript {
    fn starting_at(t: f64) -> Self {
        Self {
            samples: Vec::new(),
            t,
        }
    }

    fn new() -> Self {
        Self::starting_at(0.0)
    }

    /// Steady left-to-right reading along one line, endpoints included.
    fn read_line(mut self, y: f32, from_x: f32, to_x: f32, frames: usize) -> Self {
        for i in 0..frames {
            let x = from_x + (to_x - from_x) * i as f32 / (frames - 1) as f32;
            self = self.sample(x, y);
        }
        self
    }

    fn sample(mut self, x: f32, y: f32) -> Self {
        self.samples.push((x, y, self.t));
        self.t += FRAME_MS;
        self
    }

    /// One sample with an explicit timestamp; the frame clock still advances.
    fn stamped(mut self, x: f32, y: f32, t: f64) -> Self {
        self.samples.push((x, y, t));
        self.t += FRAME_MS;
        self
    }

    /// Three-line passage: line 0, sweep to line 1, line 1, sweep to line 2.
    fn passage(t: f64) -> Self {
        Self::starting_at(t)
            .read_line(100.0, 10.0, 500.0, 31)
            .sample(20.0, 140.0)
            .read_line(140.0, 40.0, 500.0, 30)
            .sample(20.0, 180.0)
            .read_line(180.0, 40.0, 300.0, 10)
    }
}

fn replay(session: &mut ReadingSession<64>, script: &GazeScript) -> Vec<SweepEvent> {
    let mut events = Vec::new();
    for &(x, y, t) in &script.samples {
        let _ = session.ingest(x, y, t, &mut |event: SweepEvent| events.push(event));
    }
    events
}

fn locked_session(now_ms: f64) -> ReadingSession<64> {
    let mut session = ReadingSession::<64>::default();
    session
        .begin_content(&LINES, HALF_HEIGHT, now_ms)
        .unwrap();
    session
}

fn completed_lines(events: &[SweepEvent]) -> Vec<u16> {
    events.iter().map(|event| event.completed_line).collect()
}

#[test]
fn three_line_passage_fires_once_per_sweep() {
    let mut session = locked_session(0.0);
    let events = replay(&mut session, &GazeScript::passage(0.0));

    assert_eq!(completed_lines(&events), [0, 1]);
    assert!(events.iter().all(|event| event.velocity < -0.4));
    assert_eq!(events[0].at_ms, 1_056.0);
    assert!((events[0].velocity - (20.0 - 500.0) / 33.0).abs() < 1e-3);
}

#[test]
fn nothing_fires_before_a_layout_is_locked() {
    let mut session = ReadingSession::<64>::default();
    let events = replay(&mut session, &GazeScript::passage(0.0));

    assert!(events.is_empty());
    assert_eq!(
        session.snapshot().last_verdict,
        Some(GateVerdict::BeforeContent)
    );
    assert_eq!(session.snapshot().current_line, None);
}

#[test]
fn sweeps_stamped_before_content_start_are_ignored() {
    let mut session = locked_session(1_500.0);
    let events = replay(&mut session, &GazeScript::passage(0.0));

    assert_eq!(completed_lines(&events), [1]);
}

#[test]
fn nan_timestamp_cannot_slip_past_content_start() {
    let script = GazeScript::new()
        .read_line(100.0, 10.0, 500.0, 31)
        .sample(20.0, 140.0)
        .stamped(40.0, 140.0, f64::NAN);

    let mut session = locked_session(1_500.0);
    let events = replay(&mut session, &script);

    assert!(events.is_empty());
    let snapshot = session.snapshot();
    assert_eq!(snapshot.last_verdict, Some(GateVerdict::BeforeContent));
    assert_eq!(snapshot.last_trigger_ms, None);
    assert_eq!(snapshot.max_line_reached, None);

    let rest = GazeScript::starting_at(script.t)
        .read_line(140.0, 40.0, 500.0, 30)
        .sample(20.0, 180.0)
        .read_line(180.0, 40.0, 300.0, 10);
    let events = replay(&mut session, &rest);

    assert_eq!(completed_lines(&events), [1]);
    assert_eq!(events[0].at_ms, 2_112.0);
}

#[test]
fn nan_timestamp_leaves_the_cooldown_in_force() {
    let script = GazeScript::new()
        .read_line(100.0, 10.0, 500.0, 31)
        .sample(20.0, 140.0)
        .sample(40.0, 140.0)
        .read_line(140.0, 60.0, 200.0, 5)
        .sample(20.0, 180.0)
        .stamped(40.0, 180.0, f64::NAN);

    let mut session = locked_session(0.0);
    let events = replay(&mut session, &script);

    assert_eq!(completed_lines(&events), [0]);
    assert_eq!(
        session.snapshot().last_verdict,
        Some(GateVerdict::BeforeContent)
    );
    assert_eq!(session.snapshot().last_trigger_ms, Some(1_056.0));

    // Another snap 396 ms after the first sweep.
    let rest = GazeScript::starting_at(script.t)
        .read_line(180.0, 60.0, 200.0, 3)
        .sample(20.0, 180.0)
        .sample(40.0, 180.0);
    let events = replay(&mut session, &rest);

    assert!(events.is_empty());
    let snapshot = session.snapshot();
    assert_eq!(snapshot.last_verdict, Some(GateVerdict::Cooldown));
    assert_eq!(snapshot.last_trigger_ms, Some(1_056.0));
    assert_eq!(snapshot.max_line_reached, Some(1));
}

#[test]
fn second_sweep_inside_cooldown_is_suppressed() {
    let script = GazeScript::new()
        .read_line(100.0, 10.0, 500.0, 31)
        .sample(20.0, 140.0)
        .read_line(140.0, 40.0, 200.0, 6)
        .sample(20.0, 180.0)
        .read_line(180.0, 40.0, 300.0, 10);

    let mut session = locked_session(0.0);
    let events = replay(&mut session, &script);

    assert_eq!(completed_lines(&events), [0]);
    assert_eq!(session.snapshot().last_verdict, Some(GateVerdict::Cooldown));
}

#[test]
fn valley_far_from_any_peak_does_not_fire() {
    let mut script = GazeScript::new().read_line(100.0, 10.0, 500.0, 31);
    let mut x = 500.0f32;
    for _ in 0..30 {
        x -= 3.3;
        script = script.sample(x, 140.0);
    }
    x -= 300.0;
    script = script.sample(x, 140.0);
    for _ in 0..5 {
        x -= 3.3;
        script = script.sample(x, 140.0);
    }

    let mut session = locked_session(0.0);
    let events = replay(&mut session, &script);

    assert!(events.is_empty());
    let snapshot = session.snapshot();
    assert_eq!(snapshot.current_line, Some(1));
    assert_eq!(snapshot.last_verdict, Some(GateVerdict::OutsideCascade));
}

#[test]
fn sweep_on_the_first_line_never_fires() {
    let script = GazeScript::new()
        .read_line(100.0, 10.0, 500.0, 31)
        .sample(20.0, 100.0)
        .read_line(100.0, 40.0, 200.0, 5);

    let mut session = locked_session(0.0);
    let events = replay(&mut session, &script);

    assert!(events.is_empty());
    assert_eq!(session.snapshot().last_verdict, Some(GateVerdict::FirstLine));
}

#[test]
fn rereading_a_line_does_not_report_it_again() {
    let script = GazeScript::new()
        .read_line(100.0, 10.0, 500.0, 31)
        .sample(20.0, 140.0)
        .read_line(140.0, 40.0, 500.0, 30)
        .sample(20.0, 140.0)
        .read_line(140.0, 40.0, 300.0, 10)
        .sample(20.0, 180.0)
        .read_line(180.0, 40.0, 500.0, 20)
        .sample(20.0, 140.0)
        .read_line(140.0, 40.0, 300.0, 10);

    let mut session = locked_session(0.0);
    let events = replay(&mut session, &script);

    assert_eq!(completed_lines(&events), [0, 1]);
    assert!(events.windows(2).all(|pair| pair[0].completed_line < pair[1].completed_line));
    assert_eq!(session.snapshot().max_line_reached, Some(2));
    assert_eq!(session.snapshot().last_verdict, Some(GateVerdict::NotAdvanced));
}

#[test]
fn single_out_of_band_sample_keeps_the_current_line() {
    let mut session = locked_session(0.0);
    let mut sink = |_: SweepEvent| {};

    let _ = session.ingest(10.0, 141.0, 0.0, &mut sink);
    assert_eq!(session.snapshot().current_line, Some(1));

    let _ = session.ingest(20.0, 400.0, 33.0, &mut sink);
    assert_eq!(session.snapshot().current_line, Some(1));

    let _ = session.ingest(30.0, 120.0, 66.0, &mut sink);
    assert_eq!(session.snapshot().current_line, Some(1));

    let _ = session.ingest(40.0, 179.0, 99.0, &mut sink);
    assert_eq!(session.snapshot().current_line, Some(2));
}

#[test]
fn progress_tracks_completed_lines() {
    let mut session = locked_session(0.0);
    assert_eq!(session.progress().total_lines, 3);
    assert_eq!(session.progress().progress_pct(), 0);
    assert_eq!(session.progress().mean_velocity(), None);

    let _ = replay(&mut session, &GazeScript::passage(0.0));

    let progress = session.progress();
    assert_eq!(progress.sweeps, 2);
    assert_eq!(progress.last_completed_line, Some(1));
    assert_eq!(progress.lines_completed(), 2);
    assert_eq!(progress.progress_pct(), 66);
    assert!(progress.mean_velocity().unwrap() < 0.0);
}

#[test]
fn end_content_disarms_and_clears_samples() {
    let mut session = locked_session(0.0);
    let _ = replay(&mut session, &GazeScript::passage(0.0));

    session.end_content();
    assert!(session.samples().is_empty());
    assert_eq!(session.progress(), ReadingProgress::default());
    assert_eq!(
        session.snapshot(),
        ReadingSession::<64>::default().snapshot()
    );

    let events = replay(&mut session, &GazeScript::passage(5_000.0));
    assert!(events.is_empty());
}

#[test]
fn new_content_block_starts_from_a_clean_slate() {
    let mut session = locked_session(0.0);
    assert_eq!(
        completed_lines(&replay(&mut session, &GazeScript::passage(0.0))),
        [0, 1]
    );

    session
        .begin_content(&LINES, HALF_HEIGHT, 10_000.0)
        .unwrap();
    assert_eq!(session.snapshot().max_line_reached, None);
    assert_eq!(
        completed_lines(&replay(&mut session, &GazeScript::passage(10_000.0))),
        [0, 1]
    );
}

#[test]
fn rejected_layout_leaves_session_disarmed() {
    let mut session = locked_session(0.0);
    assert_eq!(
        session.begin_content(&LINES, -1.0, 100.0),
        Err(LayoutError::InvalidHalfHeight)
    );
    assert!(!session.snapshot().armed);

    let events = replay(&mut session, &GazeScript::passage(200.0));
    assert!(events.is_empty());
}

#[test]
fn non_finite_samples_are_absorbed() {
    let script = GazeScript::new()
        .read_line(100.0, 10.0, 200.0, 10)
        .sample(f32::NAN, 100.0)
        .sample(230.0, f32::NAN)
        .read_line(100.0, 250.0, 400.0, 10);

    let mut session = locked_session(0.0);
    let events = replay(&mut session, &script);

    assert!(events.is_empty());
    assert_eq!(session.snapshot().current_line, Some(0));
}
