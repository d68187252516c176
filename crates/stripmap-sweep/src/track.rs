use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use stripmap_core::polyline_length;
use stripmap_decomposition::SweepFrame;

/// Boustrophedon coverage track of one cell.
///
/// The stored polyline is the forward traversal; the reverse traversal is the
/// same polyline walked backwards. Tracks are never empty: a cell too small
/// to hold a chord still gets a single-point track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    cell: usize,
    points: Vec<Point2<f64>>,
    chord_offsets: Vec<f64>,
    frame: SweepFrame,
}

impl Track {
    pub(crate) fn new(
        cell: usize,
        points: Vec<Point2<f64>>,
        chord_offsets: Vec<f64>,
        frame: SweepFrame,
    ) -> Self {
        debug_assert!(!points.is_empty());
        Self {
            cell,
            points,
            chord_offsets,
            frame,
        }
    }

    #[inline]
    pub fn cell(&self) -> usize {
        self.cell
    }

    /// Forward polyline in world coordinates.
    #[inline]
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn reversed_points(&self) -> Vec<Point2<f64>> {
        self.points.iter().rev().copied().collect()
    }

    #[inline]
    pub fn first(&self) -> Point2<f64> {
        self.points[0]
    }

    #[inline]
    pub fn last(&self) -> Point2<f64> {
        self.points[self.points.len() - 1]
    }

    /// Number of parallel chords in the track.
    #[inline]
    pub fn chord_count(&self) -> usize {
        self.chord_offsets.len()
    }

    /// Sweep-axis coordinate of each chord in the sweep frame.
    #[inline]
    pub fn chord_offsets(&self) -> &[f64] {
        &self.chord_offsets
    }

    #[inline]
    pub fn frame(&self) -> SweepFrame {
        self.frame
    }

    pub fn length(&self) -> f64 {
        polyline_length(&self.points)
    }

    /// True for a zero-length track.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }
}
