use crate::predicates::{
    distance_to_segment, orientation, project_param, rotate, segments_cross, segments_touch, EPS,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Where a point lies with respect to a closed region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Containment {
    Inside,
    Boundary,
    Outside,
}

/// A closed polygonal chain stored without the repeated closing vertex.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    points: Vec<Point2<f64>>,
}

impl Ring {
    /// Build a ring, dropping consecutive duplicates and an explicit closing vertex.
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        let mut out: Vec<Point2<f64>> = Vec::with_capacity(points.len());
        for p in points {
            if out.last().is_some_and(|q| *q == p) {
                continue;
            }
            out.push(p);
        }
        while out.len() > 1 && out.first() == out.last() {
            out.pop();
        }
        Self { points: out }
    }

    #[inline]
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Vertex `i`, wrapping around the ring.
    #[inline]
    pub fn vertex(&self, i: usize) -> Point2<f64> {
        self.points[i % self.points.len()]
    }

    /// Directed edges `(p_i, p_{i+1})`, closing edge included.
    pub fn edges(&self) -> impl Iterator<Item = (Point2<f64>, Point2<f64>)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Signed area, positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0.0;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            acc += p.x * q.y - q.x * p.y;
        }
        0.5 * acc
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    #[inline]
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    pub fn perimeter(&self) -> f64 {
        self.edges().map(|(a, b)| (b - a).norm()).sum()
    }

    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Return the ring with the requested orientation.
    pub fn oriented(self, ccw: bool) -> Self {
        if self.is_ccw() == ccw {
            self
        } else {
            self.reversed()
        }
    }

    /// Counter-clockwise rotation about the origin.
    pub fn rotated(&self, angle: f64) -> Self {
        Self {
            points: self.points.iter().map(|p| rotate(p, angle)).collect(),
        }
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> (Point2<f64>, Point2<f64>) {
        let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &self.points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        (min, max)
    }

    /// Absolute length tolerance scaled to the ring's extent.
    pub fn tolerance(&self) -> f64 {
        if self.points.is_empty() {
            return EPS;
        }
        let (min, max) = self.bounds();
        EPS * (max - min).norm().max(1.0)
    }

    /// Mean of the vertices; a cheap interior-ish reference point for convex rings.
    pub fn vertex_centroid(&self) -> Point2<f64> {
        let n = self.points.len().max(1) as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point2::new(sx / n, sy / n)
    }

    pub fn has_finite_coordinates(&self) -> bool {
        self.points.iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }

    /// Classify `p` against the closed region bounded by this ring.
    pub fn classify(&self, p: &Point2<f64>, tol: f64) -> Containment {
        let mut winding = 0i32;
        for (a, b) in self.edges() {
            if distance_to_segment(p, &a, &b) <= tol {
                return Containment::Boundary;
            }
            if a.y <= p.y {
                if b.y > p.y && orientation(&a, &b, p) > 0 {
                    winding += 1;
                }
            } else if b.y <= p.y && orientation(&a, &b, p) < 0 {
                winding -= 1;
            }
        }
        if winding != 0 {
            Containment::Inside
        } else {
            Containment::Outside
        }
    }

    /// True when the closed segment `[a, b]` stays inside the closed region.
    pub fn contains_segment(&self, a: &Point2<f64>, b: &Point2<f64>, tol: f64) -> bool {
        if self.classify(a, tol) == Containment::Outside
            || self.classify(b, tol) == Containment::Outside
        {
            return false;
        }
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
        splits.windows(2).all(|w| {
            let mid = a + (b - a) * (0.5 * (w[0] + w[1]));
            self.classify(&mid, tol) != Containment::Outside
        })
    }

    /// True when no two non-adjacent edges touch and adjacent edges only share
    /// their common vertex.
    pub fn is_simple(&self, tol: f64) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            for j in (i + 1)..n {
                let c = self.points[j];
                let d = self.points[(j + 1) % n];
                let adjacent = j == i + 1 || (i == 0 && j == n - 1);
                if adjacent {
                    // Shared vertex only: reject folds back onto the other edge.
                    let (shared, other_a, other_c) = if j == i + 1 { (b, a, d) } else { (a, b, c) };
                    let folded = orientation(&other_a, &shared, &other_c) == 0
                        && (other_a - shared).dot(&(other_c - shared)) > 0.0;
                    if folded {
                        return false;
                    }
                    continue;
                }
                if segments_touch(&a, &b, &c, &d, tol) {
                    return false;
                }
            }
        }
        true
    }

    /// Drop vertices lying on the straight line through their neighbours.
    pub fn without_collinear(&self) -> Self {
        let mut pts = self.points.clone();
        let mut changed = true;
        while changed && pts.len() > 3 {
            changed = false;
            let n = pts.len();
            for i in 0..n {
                let prev = pts[(i + n - 1) % n];
                let next = pts[(i + 1) % n];
                if orientation(&prev, &pts[i], &next) == 0
                    && (pts[i] - prev).dot(&(next - pts[i])) >= 0.0
                {
                    pts.remove(i);
                    changed = true;
                    break;
                }
            }
        }
        Self { points: pts }
    }
}

impl From<Vec<Point2<f64>>> for Ring {
    fn from(points: Vec<Point2<f64>>) -> Self {
        Ring::new(points)
    }
}
