//! Parallel-chord track generation.
//!
//! Work happens in the sweep frame of the decomposition, where every cell is
//! monotone along `x` and chords are vertical segments spanning the cell.

use crate::track::Track;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use stripmap_core::{chord_count, PolygonWithHoles, Ring, SensorModel, VisibilityGraph};
use stripmap_decomposition::{Cell, Decomposition, SweepFrame};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Track generation options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepParams {
    /// Pull chord ends in by half the footprint so the footprint centre keeps
    /// clear of walls. Chords shorter than the footprint collapse to a point.
    pub inset_ends: bool,
}

/// Chord positions along the sweep axis for an extent `[lo, hi]`.
///
/// The outer chords sit half a spacing inside the extremes and the gap
/// between neighbours never exceeds `spacing`.
pub fn chord_offsets(lo: f64, hi: f64, spacing: f64) -> Vec<f64> {
    let extent = hi - lo;
    let n = chord_count(extent, spacing);
    if n == 1 {
        return vec![lo + 0.5 * extent];
    }
    let step = (extent - spacing) / (n - 1) as f64;
    (0..n)
        .map(|i| lo + 0.5 * spacing + step * i as f64)
        .collect()
}

/// Vertical extent of a monotone ring at sweep coordinate `x`.
pub(crate) fn chord_span(ring: &Ring, x: f64, tol: f64) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (a, b) in ring.edges() {
        if x < a.x.min(b.x) - tol || x > a.x.max(b.x) + tol {
            continue;
        }
        if (b.x - a.x).abs() <= tol {
            lo = lo.min(a.y.min(b.y));
            hi = hi.max(a.y.max(b.y));
            continue;
        }
        let t = ((x - a.x) / (b.x - a.x)).clamp(0.0, 1.0);
        let y = a.y + t * (b.y - a.y);
        lo = lo.min(y);
        hi = hi.max(y);
    }
    (lo <= hi).then_some((lo, hi))
}

/// Routes connectors between consecutive chords inside one cell.
struct ConnectorRouter<'a> {
    ring: &'a Ring,
    tol: f64,
    graph: OnceCell<Option<VisibilityGraph>>,
}

impl<'a> ConnectorRouter<'a> {
    fn new(ring: &'a Ring) -> Self {
        Self {
            ring,
            tol: ring.tolerance(),
            graph: OnceCell::new(),
        }
    }

    /// Append the connector from `from` to `to` (excluding `from`) to `out`.
    fn connect(&self, from: Point2<f64>, to: Point2<f64>, out: &mut Vec<Point2<f64>>) {
        if (to - from).norm() <= self.tol {
            return;
        }
        if self.ring.contains_segment(&from, &to, self.tol) {
            out.push(to);
            return;
        }
        let graph = self.graph.get_or_init(|| {
            PolygonWithHoles::from_outer(self.ring.points().to_vec())
                .map(|cell| VisibilityGraph::new(&cell))
                .map_err(|err| log::warn!("cell unusable for connector routing: {err}"))
                .ok()
        });
        match graph.as_ref().and_then(|g| g.shortest_path(&from, &to)) {
            Some(path) => out.extend(path.into_iter().skip(1)),
            None => {
                log::warn!("no connector inside cell, using a straight segment");
                out.push(to);
            }
        }
    }
}

/// Build a boustrophedon track through chords at the given sweep offsets.
///
/// `ring` is the cell in the sweep frame. `inset` is the amount each chord
/// end is pulled in, if any.
pub(crate) fn build_track(
    cell: usize,
    ring: &Ring,
    offsets: &[f64],
    inset: Option<f64>,
    frame: SweepFrame,
) -> Track {
    let tol = ring.tolerance();
    let router = ConnectorRouter::new(ring);
    let mut points: Vec<Point2<f64>> = Vec::new();
    let mut kept = Vec::with_capacity(offsets.len());
    for &x in offsets {
        let Some((mut lo, mut hi)) = chord_span(ring, x, tol) else {
            continue;
        };
        if let Some(half) = inset {
            if hi - lo > 2.0 * half {
                lo += half;
                hi -= half;
            } else {
                let mid = 0.5 * (lo + hi);
                lo = mid;
                hi = mid;
            }
        }
        let (from, to) = if kept.len() % 2 == 0 { (lo, hi) } else { (hi, lo) };
        let start = Point2::new(x, from);
        let end = Point2::new(x, to);
        match points.last() {
            Some(&prev) => router.connect(prev, start, &mut points),
            None => points.push(start),
        }
        if (end - start).norm() > tol {
            points.push(end);
        }
        kept.push(x);
    }
    if points.is_empty() {
        log::warn!("cell {cell} admits no chord, using its centroid");
        points.push(ring.vertex_centroid());
    }
    let world = points.iter().map(|p| frame.to_world(p)).collect();
    Track::new(cell, world, kept, frame)
}

/// Boustrophedon track for one cell.
pub fn sweep_cell(
    cell: &Cell,
    frame: SweepFrame,
    sensor: &dyn SensorModel,
    params: &SweepParams,
) -> Track {
    let ring = frame.ring_to_frame(cell.ring());
    let (lo, hi) = ring.bounds();
    let offsets = chord_offsets(lo.x, hi.x, sensor.sweep_distance());
    let inset = params
        .inset_ends
        .then(|| 0.5 * sensor.footprint_width());
    build_track(cell.id(), &ring, &offsets, inset, frame)
}

/// Tracks for every cell of a decomposition, in cell order.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(cells = decomposition.cell_count())))]
pub fn sweep_decomposition(
    decomposition: &Decomposition,
    sensor: &dyn SensorModel,
    params: &SweepParams,
) -> Vec<Track> {
    let frame = decomposition.frame();
    #[cfg(feature = "rayon")]
    let tracks: Vec<Track> = decomposition
        .cells()
        .par_iter()
        .map(|cell| sweep_cell(cell, frame, sensor, params))
        .collect();
    #[cfg(not(feature = "rayon"))]
    let tracks: Vec<Track> = decomposition
        .cells()
        .iter()
        .map(|cell| sweep_cell(cell, frame, sensor, params))
        .collect();
    log::debug!(
        "generated {} tracks with {} chords",
        tracks.len(),
        tracks.iter().map(Track::chord_count).sum::<usize>()
    );
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use stripmap_core::{Line, PolygonWithHoles};
    use stripmap_decomposition::{Boustrophedon, Decomposer, SweepDirection};

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn offsets_start_half_a_spacing_inside() {
        let xs = chord_offsets(0.0, 10.0, 3.0);
        assert_eq!(xs.len(), 4);
        assert_relative_eq!(xs[0], 1.5);
        assert_relative_eq!(xs[3], 8.5);
        for w in xs.windows(2) {
            assert!(w[1] - w[0] <= 3.0 + 1e-12);
        }
        assert_eq!(chord_offsets(0.0, 2.0, 3.0), vec![1.0]);
    }

    #[test]
    fn square_gets_four_alternating_chords() {
        let poly =
            PolygonWithHoles::from_outer(vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)])
                .expect("valid");
        let d = Boustrophedon
            .decompose(&poly, SweepDirection::Fixed(std::f64::consts::FRAC_PI_2), 3.0)
            .expect("decomposes");
        let sensor = Line::new(3.0, 0.0).expect("valid");
        let track = sweep_cell(&d.cells()[0], d.frame(), &sensor, &SweepParams::default());
        assert_eq!(track.chord_count(), 4);
        assert_eq!(track.points().len(), 8);
        assert_relative_eq!(track.first(), p(1.5, 0.0), epsilon = 1e-9);
        assert_relative_eq!(track.points()[1], p(1.5, 10.0), epsilon = 1e-9);
        assert_relative_eq!(track.points()[2], p(3.8333333333333335, 10.0), epsilon = 1e-9);
        assert_relative_eq!(track.last(), p(8.5, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn inset_pulls_chord_ends_off_the_walls() {
        let poly =
            PolygonWithHoles::from_outer(vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)])
                .expect("valid");
        let d = Boustrophedon
            .decompose(&poly, SweepDirection::Fixed(std::f64::consts::FRAC_PI_2), 3.0)
            .expect("decomposes");
        let sensor = Line::new(3.0, 0.0).expect("valid");
        let params = SweepParams { inset_ends: true };
        let track = sweep_cell(&d.cells()[0], d.frame(), &sensor, &params);
        assert_relative_eq!(track.first(), p(1.5, 1.5), epsilon = 1e-9);
        assert_relative_eq!(track.points()[1], p(1.5, 8.5), epsilon = 1e-9);
    }

    #[test]
    fn tiny_cell_yields_degenerate_track() {
        let ring = Ring::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)]);
        let frame = SweepFrame::new(std::f64::consts::FRAC_PI_2);
        let track = build_track(0, &ring, &chord_offsets(0.0, 1.0, 3.0), Some(1.5), frame);
        assert!(track.is_degenerate());
        assert_eq!(track.chord_count(), 1);
        assert_relative_eq!(track.first(), p(0.5, 0.5), epsilon = 1e-9);
    }

    #[test]
    fn connectors_stay_inside_concave_cells() {
        // Monotone cell whose top chain dips between the first two chords.
        let ring = Ring::new(vec![
            p(0.0, 0.0),
            p(6.0, 0.0),
            p(6.0, 10.0),
            p(3.0, 4.0),
            p(0.0, 10.0),
        ]);
        let frame = SweepFrame::new(std::f64::consts::FRAC_PI_2);
        let track = build_track(0, &ring, &[2.0, 4.0], None, frame);
        assert!(track
            .points()
            .iter()
            .any(|q| (q - p(3.0, 4.0)).norm() < 1e-9));
        let tol = ring.tolerance();
        for w in track.points().windows(2) {
            assert!(ring.contains_segment(&w[0], &w[1], tol), "{w:?} leaves the cell");
        }
    }
}
