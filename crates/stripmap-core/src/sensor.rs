use serde::{Deserialize, Serialize};

/// Invalid sensor parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("footprint width must be finite and > 0 (got {0})")]
    InvalidWidth(f64),
    #[error("overlap must be in [0, 1) (got {0})")]
    InvalidOverlap(f64),
}

/// Coverage footprint of the robot's sensor or tool.
pub trait SensorModel: Send + Sync + std::fmt::Debug {
    /// Width of the strip covered while moving along a track.
    fn footprint_width(&self) -> f64;

    /// Distance between neighbouring parallel tracks.
    fn sweep_distance(&self) -> f64;
}

/// Line sensor: a fixed-width strip perpendicular to the direction of travel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    width: f64,
    overlap: f64,
}

impl Line {
    pub fn new(width: f64, overlap: f64) -> Result<Self, SensorError> {
        if !width.is_finite() || width <= 0.0 {
            return Err(SensorError::InvalidWidth(width));
        }
        if !overlap.is_finite() || !(0.0..1.0).contains(&overlap) {
            return Err(SensorError::InvalidOverlap(overlap));
        }
        Ok(Self { width, overlap })
    }

    #[inline]
    pub fn overlap(&self) -> f64 {
        self.overlap
    }
}

impl SensorModel for Line {
    #[inline]
    fn footprint_width(&self) -> f64 {
        self.width
    }

    #[inline]
    fn sweep_distance(&self) -> f64 {
        self.width * (1.0 - self.overlap)
    }
}

/// Number of chords needed to sweep an extent of `extent` with the given spacing.
///
/// The first and last chords sit half a spacing inside the extremes, so an
/// extent no wider than one spacing needs a single chord.
pub fn chord_count(extent: f64, spacing: f64) -> usize {
    if extent.is_nan() || extent <= spacing {
        return 1;
    }
    // Guard against `ceil` rounding 2.0000000001 up to 3.
    let gaps = ((extent - spacing) / spacing - 1e-9).ceil().max(0.0);
    gaps as usize + 1
}
