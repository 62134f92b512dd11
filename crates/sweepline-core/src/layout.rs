//! Locked line geometry and the sticky line hit-test.

use core::fmt;

use heapless::Vec;

/// Upper bound on lines per content block.
pub const MAX_LAYOUT_LINES: usize = 128;

/// Reasons a layout cannot be locked.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LayoutError {
    /// More line centers than the fixed table holds.
    TooManyLines { requested: usize, capacity: usize },
    /// Half-height tolerance is not a positive finite number.
    InvalidHalfHeight,
    /// A line center is NaN or infinite.
    NonFiniteCenter { index: usize },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyLines {
                requested,
                capacity,
            } => write!(f, "layout has {requested} lines, capacity is {capacity}"),
            Self::InvalidHalfHeight => f.write_str("half-height must be positive and finite"),
            Self::NonFiniteCenter { index } => write!(f, "line {index} center is not finite"),
        }
    }
}

/// Line center-Y values in top-to-bottom order plus the hit tolerance.
///
/// Built once per content block from external layout measurement and never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct LineLayout {
    centers: Vec<f32, MAX_LAYOUT_LINES>,
    half_height: f32,
}

impl LineLayout {
    pub fn new(centers: &[f32], half_height: f32) -> Result<Self, LayoutError> {
        if !half_height.is_finite() || half_height <= 0.0 {
            return Err(LayoutError::InvalidHalfHeight);
        }
        if let Some(index) = centers.iter().position(|center| !center.is_finite()) {
            return Err(LayoutError::NonFiniteCenter { index });
        }

        let mut table = Vec::new();
        table
            .extend_from_slice(centers)
            .map_err(|_| LayoutError::TooManyLines {
                requested: centers.len(),
                capacity: MAX_LAYOUT_LINES,
            })?;

        Ok(Self {
            centers: table,
            half_height,
        })
    }

    pub fn line_count(&self) -> u16 {
        self.centers.len() as u16
    }

    pub fn half_height(&self) -> f32 {
        self.half_height
    }

    /// First line whose band `[center - half, center + half]` contains `y`.
    pub fn hit(&self, y: f32) -> Option<u16> {
        if !y.is_finite() {
            return None;
        }

        self.centers
            .iter()
            .position(|center| {
                let offset = y - center;
                offset <= self.half_height && -offset <= self.half_height
            })
            .map(|index| index as u16)
    }
}

/// Hit-test that keeps the last matched line across misses.
///
/// Tracking noise that briefly lands between bands must not sever the
/// reader's line context, so a miss returns the previous answer. Only a
/// positive match moves the result.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LineLocator {
    current: Option<u16>,
}

impl LineLocator {
    pub const fn new() -> Self {
        Self { current: None }
    }

    pub const fn current(&self) -> Option<u16> {
        self.current
    }

    /// Locates `y` against `layout`. With no layout nothing ever matches.
    pub fn locate(&mut self, layout: Option<&LineLayout>, y: f32) -> Option<u16> {
        if let Some(line) = layout.and_then(|layout| layout.hit(y)) {
            self.current = Some(line);
        }
        self.current
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
