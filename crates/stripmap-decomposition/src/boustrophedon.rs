//! Sweep-line cell decomposition.
//!
//! The polygon is rotated into the sweep frame, where chords are vertical.
//! Vertical rays are cast from event vertices to the nearest boundary above
//! and below; the resulting cuts together with the boundary form a planar
//! subdivision whose faces are the cells.
//!
//! Two cut rules are supported:
//! - critical vertices only (boustrophedon): vertices where the free space
//!   splits or merges along the sweep, which keeps cells few and monotone;
//! - every vertex (trapezoidal): any vertex whose vertical ray enters free
//!   space, producing trapezoids.

use crate::adjacency::AdjacencyGraph;
use crate::cell::{Cell, Decomposition, SharedEdge, SweepFrame};
use crate::decomposer::{DecompositionKind, Decomposer};
use crate::error::DecompositionError;
use crate::planar::Subdivision;
use nalgebra::{Point2, Vector2};
use std::collections::BTreeSet;
use stripmap_core::{cross, wrap_half_turn, PolygonWithHoles, Ring};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Cells smaller than this fraction of the free-space area are dropped.
const AREA_FLOOR_REL: f64 = 1e-9;
/// Allowed relative mismatch between the cell areas and the free space.
const AREA_CHECK_REL: f64 = 1e-6;
/// Angular margin for "strictly inside the free-space wedge".
const WEDGE_TOL: f64 = 1e-9;

/// Boustrophedon cellular decomposition: cuts at critical vertices only.
#[derive(Clone, Copy, Debug, Default)]
pub struct Boustrophedon;

/// Trapezoidal decomposition: cuts at every vertex.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trapezoidal;

impl Decomposer for Boustrophedon {
    fn kind(&self) -> DecompositionKind {
        DecompositionKind::Boustrophedon
    }

    fn decompose_at(
        &self,
        polygon: &PolygonWithHoles,
        direction: f64,
    ) -> Result<Decomposition, DecompositionError> {
        decompose_with_rule(polygon, direction, CutRule::Critical)
    }
}

impl Decomposer for Trapezoidal {
    fn kind(&self) -> DecompositionKind {
        DecompositionKind::Trapezoidal
    }

    fn decompose_at(
        &self,
        polygon: &PolygonWithHoles,
        direction: f64,
    ) -> Result<Decomposition, DecompositionError> {
        decompose_with_rule(polygon, direction, CutRule::EveryVertex)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CutRule {
    Critical,
    EveryVertex,
}

#[derive(Clone, Copy, Debug)]
enum Hit {
    Vertex(usize),
    Edge {
        ring: usize,
        edge: usize,
        t: f64,
        point: Point2<f64>,
    },
}

/// Boundary rings in the sweep frame with global node numbering.
struct FrameRings {
    rings: Vec<Vec<Point2<f64>>>,
    offsets: Vec<usize>,
    tol: f64,
}

impl FrameRings {
    fn new(polygon: &PolygonWithHoles) -> Self {
        let mut rings = Vec::new();
        let mut offsets = Vec::new();
        let mut total = 0;
        for (_, ring) in polygon.rings() {
            offsets.push(total);
            total += ring.len();
            rings.push(ring.points().to_vec());
        }
        Self {
            rings,
            offsets,
            tol: polygon.tolerance(),
        }
    }

    #[inline]
    fn node(&self, ring: usize, i: usize) -> usize {
        self.offsets[ring] + i % self.rings[ring].len()
    }

    /// True when `dir` points strictly into the free space at vertex `i`.
    ///
    /// The free-space wedge runs counter-clockwise from the outgoing edge to
    /// the reversed incoming edge.
    fn enters_free_space(&self, ring: usize, i: usize, dir: f64) -> bool {
        let pts = &self.rings[ring];
        let n = pts.len();
        let v = pts[i];
        let out = pts[(i + 1) % n] - v;
        let back = pts[(i + n - 1) % n] - v;
        let ray = Vector2::new(0.0, dir);
        let along = |e: &Vector2<f64>| e.x.abs() <= self.tol && e.y * dir > 0.0;
        if along(&out) || along(&back) {
            return false;
        }
        let a_ray = ccw_angle(&out, &ray);
        let a_back = ccw_angle(&out, &back);
        a_ray > WEDGE_TOL && a_ray < a_back - WEDGE_TOL
    }

    /// True when the vertex (or the vertical chain containing it) has both
    /// boundary neighbours on the same side of its sweep coordinate.
    fn is_sweep_extremal(&self, ring: usize, i: usize) -> bool {
        let pts = &self.rings[ring];
        let n = pts.len();
        let x = pts[i].x;
        let mut k = 1;
        while k < n && (pts[(i + n - k) % n].x - x).abs() <= self.tol {
            k += 1;
        }
        let before = pts[(i + n - k) % n].x - x;
        let mut k = 1;
        while k < n && (pts[(i + k) % n].x - x).abs() <= self.tol {
            k += 1;
        }
        let after = pts[(i + k) % n].x - x;
        before * after > 0.0
    }

    /// Nearest boundary point hit by a vertical ray from vertex `(ring, i)`.
    fn cast(&self, ring: usize, i: usize, dir: f64) -> Option<Hit> {
        let origin_node = self.node(ring, i);
        let v = self.rings[ring][i];
        let tol = self.tol;
        let mut best: Option<(f64, Hit)> = None;
        let mut consider = |y: f64, hit: Hit| {
            let d = (y - v.y) * dir;
            if d <= tol {
                return;
            }
            let better = match best {
                None => true,
                Some((bd, bh)) => {
                    d < bd - tol
                        || ((d - bd).abs() <= tol
                            && matches!(hit, Hit::Vertex(_))
                            && matches!(bh, Hit::Edge { .. }))
                }
            };
            if better {
                best = Some((d, hit));
            }
        };

        for (r, pts) in self.rings.iter().enumerate() {
            let n = pts.len();
            for j in 0..n {
                let (na, nb) = (self.node(r, j), self.node(r, j + 1));
                if na == origin_node || nb == origin_node {
                    continue;
                }
                let a = pts[j];
                let b = pts[(j + 1) % n];
                if v.x < a.x.min(b.x) - tol || v.x > a.x.max(b.x) + tol {
                    continue;
                }
                if (b.x - a.x).abs() <= tol {
                    consider(a.y, Hit::Vertex(na));
                    consider(b.y, Hit::Vertex(nb));
                } else if (a.x - v.x).abs() <= tol {
                    consider(a.y, Hit::Vertex(na));
                } else if (b.x - v.x).abs() <= tol {
                    consider(b.y, Hit::Vertex(nb));
                } else {
                    let t = (v.x - a.x) / (b.x - a.x);
                    if t <= 0.0 || t >= 1.0 {
                        continue;
                    }
                    let y = a.y + t * (b.y - a.y);
                    consider(
                        y,
                        Hit::Edge {
                            ring: r,
                            edge: j,
                            t,
                            point: Point2::new(v.x, y),
                        },
                    );
                }
            }
        }
        best.map(|(_, h)| h)
    }
}

/// Counter-clockwise angle from `from` to `to`, in `[0, 2π)`.
fn ccw_angle(from: &Vector2<f64>, to: &Vector2<f64>) -> f64 {
    cross(*from, *to)
        .atan2(from.dot(to))
        .rem_euclid(std::f64::consts::TAU)
}

#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(polygon), fields(vertices = polygon.vertex_count())))]
fn decompose_with_rule(
    polygon: &PolygonWithHoles,
    direction: f64,
    rule: CutRule,
) -> Result<Decomposition, DecompositionError> {
    if !direction.is_finite() {
        return Err(DecompositionError::InvalidDirection(direction));
    }
    let frame = SweepFrame::new(wrap_half_turn(direction));
    let frame_polygon = polygon.rotated(frame.angle());
    let rings = FrameRings::new(&frame_polygon);

    // Cast rays from every qualifying vertex.
    let mut hits: Vec<(usize, Hit)> = Vec::new();
    for (r, pts) in rings.rings.iter().enumerate() {
        for i in 0..pts.len() {
            if rule == CutRule::Critical && !rings.is_sweep_extremal(r, i) {
                continue;
            }
            for dir in [1.0, -1.0] {
                if !rings.enters_free_space(r, i, dir) {
                    continue;
                }
                match rings.cast(r, i, dir) {
                    Some(hit) => hits.push((rings.node(r, i), hit)),
                    None => log::warn!(
                        "ray from vertex {i} of ring {r} found no boundary, skipping cut"
                    ),
                }
            }
        }
    }

    let mut sub = Subdivision::default();
    for pts in &rings.rings {
        for p in pts {
            sub.add_node(*p);
        }
    }

    // Split boundary edges at ray hits.
    let mut splits: Vec<Vec<Vec<(f64, usize)>>> = rings
        .rings
        .iter()
        .map(|pts| vec![Vec::new(); pts.len()])
        .collect();
    let mut cut_pairs: BTreeSet<(usize, usize)> = BTreeSet::new();
    for &(from, hit) in &hits {
        let to = match hit {
            Hit::Vertex(node) => node,
            Hit::Edge {
                ring,
                edge,
                t,
                point,
            } => {
                let pts = &rings.rings[ring];
                let len = (pts[(edge + 1) % pts.len()] - pts[edge]).norm();
                let bucket = &mut splits[ring][edge];
                match bucket
                    .iter()
                    .find(|(s, _)| (s - t).abs() * len <= rings.tol)
                {
                    Some(&(_, node)) => node,
                    None => {
                        let node = sub.add_node(point);
                        bucket.push((t, node));
                        node
                    }
                }
            }
        };
        if from != to {
            cut_pairs.insert((from.min(to), from.max(to)));
        }
    }

    for (r, pts) in rings.rings.iter().enumerate() {
        for j in 0..pts.len() {
            let bucket = &mut splits[r][j];
            bucket.sort_by(|a, b| a.0.total_cmp(&b.0));
            let mut prev = rings.node(r, j);
            for &(_, node) in bucket.iter() {
                sub.add_boundary_edge(prev, node);
                prev = node;
            }
            sub.add_boundary_edge(prev, rings.node(r, j + 1));
        }
    }
    for &(a, b) in &cut_pairs {
        sub.add_cut(a, b);
    }

    let (faces, face_of) = sub.trace_faces()?;

    // Faces become cells; slivers from numerical edge cases are dropped.
    let free_area = polygon.area();
    let floor = AREA_FLOOR_REL * free_area;
    let mut cell_of_face = vec![None; faces.len()];
    let mut cells = Vec::new();
    for (f, face) in faces.iter().enumerate() {
        let frame_ring = Ring::new(face.nodes.iter().map(|&n| sub.points[n]).collect());
        let area = frame_ring.signed_area();
        if area <= floor || frame_ring.len() < 3 {
            log::warn!("dropping degenerate face {f} (area {area:.3e})");
            continue;
        }
        let world = frame_ring.without_collinear().rotated(-frame.angle());
        cell_of_face[f] = Some(cells.len());
        cells.push(Cell::new(cells.len(), world));
    }
    if cells.is_empty() {
        return Err(DecompositionError::NoCells);
    }

    let mut shared: Vec<SharedEdge> = Vec::new();
    let mut sides: Vec<Vec<usize>> = vec![Vec::new(); sub.cut_count()];
    for (h, he) in sub.half_edges.iter().enumerate() {
        if let Some(c) = he.cut {
            sides[c].push(h);
        }
    }
    for pair in &sides {
        let [h1, h2] = pair.as_slice() else {
            continue;
        };
        let (Some(a), Some(b)) = (cell_of_face[face_of[*h1]], cell_of_face[face_of[*h2]]) else {
            continue;
        };
        if a == b {
            continue;
        }
        let he = sub.half_edges[*h1];
        let segment = [
            frame.to_world(&sub.points[he.from]),
            frame.to_world(&sub.points[he.to]),
        ];
        let (a, b) = (a.min(b), a.max(b));
        match shared.iter_mut().find(|e| e.a == a && e.b == b) {
            Some(existing) => existing.segment = span(&existing.segment, &segment),
            None => shared.push(SharedEdge { a, b, segment }),
        }
    }

    let decomposition = Decomposition::new(cells, shared, frame);

    let actual = decomposition.total_area();
    if (actual - free_area).abs() > AREA_CHECK_REL * free_area {
        return Err(DecompositionError::AreaMismatch {
            expected: free_area,
            actual,
        });
    }
    let components = AdjacencyGraph::from_cells(decomposition.cells()).component_count();
    if components > 1 {
        return Err(DecompositionError::Disconnected { components });
    }

    log::debug!(
        "{:?} decomposition at {:.4} rad: {} cells, {} shared edges",
        rule,
        frame.direction(),
        decomposition.cell_count(),
        decomposition.shared_edges().len()
    );
    Ok(decomposition)
}

/// Longest segment spanned by two collinear segments.
fn span(s: &[Point2<f64>; 2], t: &[Point2<f64>; 2]) -> [Point2<f64>; 2] {
    let pts = [s[0], s[1], t[0], t[1]];
    let mut best = *s;
    let mut best_len = (s[1] - s[0]).norm_squared();
    for i in 0..4 {
        for j in (i + 1)..4 {
            let len = (pts[j] - pts[i]).norm_squared();
            if len > best_len {
                best_len = len;
                best = [pts[i], pts[j]];
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    fn square_with_hole() -> PolygonWithHoles {
        PolygonWithHoles::new(
            vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)],
            vec![vec![p(4.0, 4.0), p(6.0, 4.0), p(6.0, 6.0), p(4.0, 6.0)]],
        )
        .expect("valid polygon")
    }

    #[test]
    fn convex_polygon_is_one_cell() {
        let poly =
            PolygonWithHoles::from_outer(vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)])
                .expect("valid");
        for angle in [0.0, 0.3, FRAC_PI_2, 2.0] {
            let d = Boustrophedon.decompose_at(&poly, angle).expect("decomposes");
            assert_eq!(d.cell_count(), 1);
            assert_relative_eq!(d.total_area(), 100.0, max_relative = 1e-9);
        }
    }

    #[test]
    fn square_with_hole_splits_around_it() {
        let d = Boustrophedon
            .decompose_at(&square_with_hole(), FRAC_PI_2)
            .expect("decomposes");
        assert_eq!(d.cell_count(), 4);
        assert_eq!(d.shared_edges().len(), 4);
        assert!(d.adjacency().is_connected());
        assert_relative_eq!(d.total_area(), 96.0, max_relative = 1e-9);
        for cell in d.cells() {
            assert!(cell.ring().is_ccw());
            assert_eq!(cell.neighbours().len(), 2);
        }
    }

    #[test]
    fn rotated_sweep_still_partitions() {
        let d = Boustrophedon
            .decompose_at(&square_with_hole(), 0.4)
            .expect("decomposes");
        assert!(d.cell_count() > 1);
        assert!(d.adjacency().is_connected());
        assert_relative_eq!(d.total_area(), 96.0, max_relative = 1e-6);
    }

    #[test]
    fn notch_parallel_to_chords_is_an_event() {
        // U-shape opening upwards; horizontal chords meet the notch floor.
        let poly = PolygonWithHoles::from_outer(vec![
            p(0.0, 0.0),
            p(10.0, 0.0),
            p(10.0, 10.0),
            p(7.0, 10.0),
            p(7.0, 3.0),
            p(3.0, 3.0),
            p(3.0, 10.0),
            p(0.0, 10.0),
        ])
        .expect("valid");
        let vertical = Boustrophedon.decompose_at(&poly, FRAC_PI_2).expect("ok");
        assert_eq!(vertical.cell_count(), 1);

        let horizontal = Boustrophedon.decompose_at(&poly, 0.0).expect("ok");
        assert_eq!(horizontal.cell_count(), 3);
        assert_relative_eq!(horizontal.total_area(), 72.0, max_relative = 1e-9);
        assert!(horizontal.adjacency().is_connected());
    }

    #[test]
    fn trapezoidal_cuts_at_every_vertex() {
        let poly = PolygonWithHoles::from_outer(vec![
            p(0.0, 0.0),
            p(4.0, -2.0),
            p(8.0, 0.0),
            p(8.0, 4.0),
            p(4.0, 6.0),
            p(0.0, 4.0),
        ])
        .expect("valid");
        let bcd = Boustrophedon.decompose_at(&poly, FRAC_PI_2).expect("ok");
        let trap = Trapezoidal.decompose_at(&poly, FRAC_PI_2).expect("ok");
        assert_eq!(bcd.cell_count(), 1);
        assert_eq!(trap.cell_count(), 2);
        assert_relative_eq!(trap.total_area(), poly.area(), max_relative = 1e-9);
    }

    #[test]
    fn rejects_non_finite_direction() {
        assert!(matches!(
            Boustrophedon.decompose_at(&square_with_hole(), f64::NAN),
            Err(DecompositionError::InvalidDirection(_))
        ));
    }
}
