//! Fixed-capacity gaze sample ring.

/// 60 s of history at the nominal 30 Hz feed.
pub const DEFAULT_SAMPLE_CAPACITY: usize = 1_800;

/// One gaze sample in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    /// Monotonic milliseconds.
    pub t: f64,
}

impl Sample {
    pub const fn new(x: f32, y: f32, t: f64) -> Self {
        Self { x, y, t }
    }
}

/// Circular sample store kept as three index-aligned arrays.
///
/// Single writer, append-only with wraparound. Readers address samples by
/// their distance from the newest write, so the ring never has to be scanned.
#[derive(Clone)]
pub struct SampleRing<const N: usize> {
    xs: [f32; N],
    ys: [f32; N],
    ts: [f64; N],
    write: usize,
    count: usize,
}

impl<const N: usize> Default for SampleRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SampleRing<N> {
    pub const fn new() -> Self {
        Self {
            xs: [0.0; N],
            ys: [0.0; N],
            ts: [0.0; N],
            write: 0,
            count: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of readable samples, `min(total writes, capacity)`.
    pub const fn len(&self) -> usize {
        self.count
    }

    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Slot the next `push` writes into.
    pub const fn write_index(&self) -> usize {
        self.write
    }

    /// Appends a sample, overwriting the oldest one once full.
    pub fn push(&mut self, x: f32, y: f32, t: f64) {
        if N == 0 {
            return;
        }

        self.xs[self.write] = x;
        self.ys[self.write] = y;
        self.ts[self.write] = t;
        self.write = (self.write + 1) % N;
        if self.count < N {
            self.count += 1;
        }
    }

    /// Sample `offset` steps back from the newest write (`0` is the newest).
    ///
    /// Returns `None` when fewer than `offset + 1` samples are buffered.
    pub fn sample_at(&self, offset: usize) -> Option<Sample> {
        if offset >= self.count {
            return None;
        }

        let index = (self.write + N - 1 - offset) % N;
        Some(Sample {
            x: self.xs[index],
            y: self.ys[index],
            t: self.ts[index],
        })
    }

    /// Newest sample, if any.
    pub fn newest(&self) -> Option<Sample> {
        self.sample_at(0)
    }

    /// Resets the cursors. Stored values are left in place and become
    /// unreachable until overwritten.
    pub fn clear(&mut self) {
        self.write = 0;
        self.count = 0;
    }
}
