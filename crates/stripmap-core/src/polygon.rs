//! Polygon with holes: the free space a coverage plan must sweep.
//!
//! Orientation is normalised on construction (outer ring counter-clockwise,
//! holes clockwise) so the free space always lies to the left of every
//! directed boundary edge. Downstream code relies on that convention.

use crate::predicates::{distance_to_segment, project_param, segments_cross, segments_touch, wrap_half_turn};
use crate::ring::{Containment, Ring};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one ring of a [`PolygonWithHoles`] in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingId {
    Outer,
    Hole(usize),
}

impl fmt::Display for RingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RingId::Outer => write!(f, "outer boundary"),
            RingId::Hole(i) => write!(f, "hole {i}"),
        }
    }
}

/// Malformed polygon input.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("{ring} has {count} distinct points, at least 3 are required")]
    TooFewPoints { ring: RingId, count: usize },
    #[error("{ring} contains non-finite coordinates")]
    NonFinite { ring: RingId },
    #[error("{ring} has zero area")]
    ZeroArea { ring: RingId },
    #[error("{ring} self-intersects")]
    SelfIntersecting { ring: RingId },
    #[error("hole {hole} is not strictly inside the outer boundary")]
    HoleNotInterior { hole: usize },
    #[error("holes {a} and {b} intersect or are nested")]
    HolesIntersect { a: usize, b: usize },
}

/// A validated polygon with zero or more holes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolygonWithHoles {
    outer: Ring,
    holes: Vec<Ring>,
}

impl PolygonWithHoles {
    /// Validate and build a polygon; orientation of the input rings is ignored.
    pub fn new(
        outer: Vec<Point2<f64>>,
        holes: Vec<Vec<Point2<f64>>>,
    ) -> Result<Self, GeometryError> {
        let outer = validate_ring(Ring::new(outer), RingId::Outer)?.oriented(true);
        let tol = outer.tolerance();

        let mut checked: Vec<Ring> = Vec::with_capacity(holes.len());
        for (idx, raw) in holes.into_iter().enumerate() {
            let hole = validate_ring(Ring::new(raw), RingId::Hole(idx))?.oriented(false);
            let interior = hole
                .points()
                .iter()
                .all(|p| outer.classify(p, tol) == Containment::Inside);
            if !interior || rings_touch(&outer, &hole, tol) {
                return Err(GeometryError::HoleNotInterior { hole: idx });
            }
            for (other_idx, other) in checked.iter().enumerate() {
                let nested = other.classify(&hole.vertex(0), tol) != Containment::Outside
                    || hole.classify(&other.vertex(0), tol) != Containment::Outside;
                if nested || rings_touch(other, &hole, tol) {
                    return Err(GeometryError::HolesIntersect {
                        a: other_idx,
                        b: idx,
                    });
                }
            }
            checked.push(hole);
        }

        Ok(Self {
            outer,
            holes: checked,
        })
    }

    /// Hole-free polygon.
    pub fn from_outer(outer: Vec<Point2<f64>>) -> Result<Self, GeometryError> {
        Self::new(outer, Vec::new())
    }

    #[inline]
    pub fn outer(&self) -> &Ring {
        &self.outer
    }

    #[inline]
    pub fn holes(&self) -> &[Ring] {
        &self.holes
    }

    #[inline]
    pub fn hole_count(&self) -> usize {
        self.holes.len()
    }

    pub fn hole_vertex_count(&self) -> usize {
        self.holes.iter().map(Ring::len).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.outer.len() + self.hole_vertex_count()
    }

    /// All rings, outer boundary first.
    pub fn rings(&self) -> impl Iterator<Item = (RingId, &Ring)> + '_ {
        std::iter::once((RingId::Outer, &self.outer)).chain(
            self.holes
                .iter()
                .enumerate()
                .map(|(i, h)| (RingId::Hole(i), h)),
        )
    }

    /// Every directed boundary edge; free space lies on the left of each.
    pub fn edges(&self) -> impl Iterator<Item = (Point2<f64>, Point2<f64>)> + '_ {
        self.rings().flat_map(|(_, r)| r.edges())
    }

    /// Free-space area: outer area minus hole areas.
    pub fn area(&self) -> f64 {
        self.outer.area() - self.holes.iter().map(Ring::area).sum::<f64>()
    }

    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.outer.tolerance()
    }

    /// Classify a point against the closed free space.
    pub fn classify(&self, p: &Point2<f64>) -> Containment {
        let tol = self.tolerance();
        match self.outer.classify(p, tol) {
            Containment::Outside => Containment::Outside,
            Containment::Boundary => Containment::Boundary,
            Containment::Inside => {
                for hole in &self.holes {
                    match hole.classify(p, tol) {
                        Containment::Inside => return Containment::Outside,
                        Containment::Boundary => return Containment::Boundary,
                        Containment::Outside => {}
                    }
                }
                Containment::Inside
            }
        }
    }

    /// True when `p` lies in the closed free space.
    #[inline]
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        self.classify(p) != Containment::Outside
    }

    /// True when the closed segment `[a, b]` stays inside the closed free space.
    ///
    /// The segment may run along boundary edges or touch vertices, but it may
    /// not cross an edge or pass through the interior of a hole.
    pub fn segment_in_free_space(&self, a: &Point2<f64>, b: &Point2<f64>) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        if (b - a).norm() <= self.tolerance() {
            return true;
        }
        let tol = self.tolerance();
        let mut splits = vec![0.0, 1.0];
        for (c, d) in self.edges() {
            if segments_cross(a, b, &c, &d) {
                return false;
            }
            if distance_to_segment(&c, a, b) <= tol {
                splits.push(project_param(&c, a, b).clamp(0.0, 1.0));
            }
        }
        splits.sort_by(f64::total_cmp);
        splits.dedup_by(|x, y| (*x - *y).abs() <= f64::EPSILON);
        splits.windows(2).all(|w| {
            let mid = a + (b - a) * (0.5 * (w[0] + w[1]));
            self.contains(&mid)
        })
    }

    /// Counter-clockwise rotation of every ring about the origin.
    pub fn rotated(&self, angle: f64) -> Self {
        Self {
            outer: self.outer.rotated(angle),
            holes: self.holes.iter().map(|h| h.rotated(angle)).collect(),
        }
    }

    /// Distinct edge directions in `[0, π)`, in boundary order.
    pub fn edge_directions(&self) -> Vec<f64> {
        let mut out: Vec<f64> = Vec::new();
        for (a, b) in self.edges() {
            let d = b - a;
            let angle = wrap_half_turn(d.y.atan2(d.x));
            let duplicate = out.iter().any(|&o| {
                let diff = (o - angle).abs();
                diff < 1e-6 || (std::f64::consts::PI - diff) < 1e-6
            });
            if !duplicate {
                out.push(angle);
            }
        }
        out
    }
}

fn validate_ring(ring: Ring, id: RingId) -> Result<Ring, GeometryError> {
    if ring.len() < 3 {
        return Err(GeometryError::TooFewPoints {
            ring: id,
            count: ring.len(),
        });
    }
    if !ring.has_finite_coordinates() {
        return Err(GeometryError::NonFinite { ring: id });
    }
    let tol = ring.tolerance();
    if ring.area() <= tol * tol {
        return Err(GeometryError::ZeroArea { ring: id });
    }
    if !ring.is_simple(tol) {
        return Err(GeometryError::SelfIntersecting { ring: id });
    }
    Ok(ring)
}

fn rings_touch(a: &Ring, b: &Ring, tol: f64) -> bool {
    a.edges()
        .any(|(p, q)| b.edges().any(|(r, s)| segments_touch(&p, &q, &r, &s, tol)))
}
