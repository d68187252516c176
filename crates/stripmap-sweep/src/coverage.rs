//! Footprint coverage checks and gap filling.

use crate::generator::{build_track, chord_span};
use crate::track::Track;
use nalgebra::Point2;
use stripmap_core::{distance_to_segment, Ring, SensorModel};
use stripmap_decomposition::Cell;

/// Column and row size of the coverage check, as a fraction of the footprint
/// width.
const SAMPLE_PITCH: f64 = 0.25;

/// How often a trapezoid that no single segment covers is quartered before
/// it is reported as a gap.
const MAX_SPLIT_DEPTH: u32 = 4;

/// Distance from `p` to a polyline; a single point counts as a polyline.
pub fn distance_to_polyline(p: &Point2<f64>, path: &[Point2<f64>]) -> f64 {
    match path {
        [] => f64::INFINITY,
        [q] => (p - q).norm(),
        _ => path
            .windows(2)
            .map(|w| distance_to_segment(p, &w[0], &w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Part of a monotone ring between two cuts, where both walls are straight.
struct Column {
    xa: f64,
    xb: f64,
    /// Lower and upper wall at `xa`.
    a: (f64, f64),
    /// Lower and upper wall at `xb`.
    b: (f64, f64),
}

impl Column {
    /// Point at fraction `s` across and `t` up the column.
    fn at(&self, s: f64, t: f64) -> Point2<f64> {
        let lo = self.a.0 + s * (self.b.0 - self.a.0);
        let hi = self.a.1 + s * (self.b.1 - self.a.1);
        Point2::new(self.xa + s * (self.xb - self.xa), lo + t * (hi - lo))
    }

    fn height(&self) -> f64 {
        (self.a.1 - self.a.0).max(self.b.1 - self.b.0)
    }
}

/// Pushes the centre of every piece of `column` in `[s0, s1] x [t0, t1]`
/// that is not certified as covered.
///
/// A piece is a trapezoid and a segment's `radius` neighbourhood is convex,
/// so four covered corners cover the whole piece.
fn collect_gaps(
    column: &Column,
    segments: &[(Point2<f64>, Point2<f64>)],
    radius: f64,
    (s0, s1): (f64, f64),
    (t0, t1): (f64, f64),
    depth: u32,
    out: &mut Vec<Point2<f64>>,
) {
    let corners = [
        column.at(s0, t0),
        column.at(s1, t0),
        column.at(s1, t1),
        column.at(s0, t1),
    ];
    let covered = segments.iter().any(|(a, b)| {
        corners
            .iter()
            .all(|c| distance_to_segment(c, a, b) <= radius)
    });
    if covered {
        return;
    }
    let (sm, tm) = (0.5 * (s0 + s1), 0.5 * (t0 + t1));
    if depth >= MAX_SPLIT_DEPTH {
        out.push(column.at(sm, tm));
        return;
    }
    for s in [(s0, sm), (sm, s1)] {
        for t in [(t0, tm), (tm, t1)] {
            collect_gaps(column, segments, radius, s, t, depth + 1, out);
        }
    }
}

/// Points of `ring` that may lie farther than `radius` from every path.
///
/// `ring` must be monotone along `x`. It is cut into columns at its
/// vertices, every `pitch`, and every path vertex and its `radius`
/// neighbours along `x`; columns are split into trapezoids at most `pitch`
/// high. A trapezoid passes when one path segment has all its corners within
/// `radius`. Failing trapezoids are quartered a few times and then reported
/// by their centre, ordered by `x` then `y`. An empty result means every
/// point of the ring is within `radius` of a path.
pub fn coverage_gaps(
    ring: &Ring,
    paths: &[&[Point2<f64>]],
    radius: f64,
    pitch: f64,
) -> Vec<Point2<f64>> {
    let tol = ring.tolerance();
    let pitch = pitch.max(tol);
    let radius = radius + tol;
    let (lo, hi) = ring.bounds();

    let segments: Vec<(Point2<f64>, Point2<f64>)> = paths
        .iter()
        .flat_map(|path| match path {
            [q] => vec![(*q, *q)],
            _ => path.windows(2).map(|w| (w[0], w[1])).collect(),
        })
        .collect();

    let mut cuts: Vec<f64> = ring.points().iter().map(|p| p.x).collect();
    let steps = ((hi.x - lo.x) / pitch).ceil() as usize;
    cuts.extend((0..=steps).map(|i| lo.x + pitch * i as f64));
    for q in paths.iter().flat_map(|path| path.iter()) {
        cuts.extend([q.x - radius, q.x, q.x + radius]);
    }
    cuts.retain(|x| *x > lo.x && *x < hi.x);
    cuts.extend([lo.x, hi.x]);
    cuts.sort_by(f64::total_cmp);
    cuts.dedup_by(|a, b| (*a - *b).abs() <= tol);

    // Columns are evaluated slightly inside their cuts so vertical walls on
    // a cut do not widen the span.
    let inset = 2.0 * tol;
    let mut gaps = Vec::new();
    for w in cuts.windows(2) {
        let (xa, xb) = (w[0] + inset, w[1] - inset);
        if xb <= xa {
            continue;
        }
        let (Some(a), Some(b)) = (chord_span(ring, xa, 0.0), chord_span(ring, xb, 0.0)) else {
            continue;
        };
        let column = Column { xa, xb, a, b };
        let nearby: Vec<(Point2<f64>, Point2<f64>)> = segments
            .iter()
            .filter(|(p, q)| p.x.max(q.x) >= xa - radius && p.x.min(q.x) <= xb + radius)
            .copied()
            .collect();
        let rows = (column.height() / pitch).ceil().max(1.0) as usize;
        for r in 0..rows {
            let t = (r as f64 / rows as f64, (r + 1) as f64 / rows as f64);
            collect_gaps(&column, &nearby, radius, (0.0, 1.0), t, 0, &mut gaps);
        }
    }
    gaps.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    gaps
}

/// Add full-span chords to `track` until every point of the cell lies within
/// half a footprint of it.
///
/// Each added chord passes through the first reported gap, which is inside
/// the cell, so every round covers new ground.
pub fn densify_for_coverage(cell: &Cell, track: &Track, sensor: &dyn SensorModel) -> Track {
    let frame = track.frame();
    let ring = frame.ring_to_frame(cell.ring());
    let width = sensor.footprint_width();
    let pitch = SAMPLE_PITCH * width;
    let radius = 0.5 * width;
    let (lo, hi) = ring.bounds();
    let max_rounds = 2 * ((hi.x - lo.x) / pitch).ceil() as usize + ring.len() + 2;

    let mut offsets = track.chord_offsets().to_vec();
    let mut current = build_track(cell.id(), &ring, &offsets, None, frame);
    for _ in 0..max_rounds {
        let frame_points: Vec<Point2<f64>> =
            current.points().iter().map(|p| frame.to_frame(p)).collect();
        let gaps = coverage_gaps(&ring, &[&frame_points], radius, pitch);
        let Some(first) = gaps.first() else {
            return current;
        };
        log::debug!(
            "cell {}: {} uncovered pieces, adding chord at {:.3}",
            cell.id(),
            gaps.len(),
            first.x
        );
        offsets.push(first.x);
        offsets.sort_by(f64::total_cmp);
        offsets.dedup_by(|a, b| (*a - *b).abs() <= ring.tolerance());
        current = build_track(cell.id(), &ring, &offsets, None, frame);
    }
    log::warn!("cell {}: coverage not certified after {max_rounds} chords", cell.id());
    current
}
