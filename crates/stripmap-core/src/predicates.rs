//! Tolerance-aware 2D predicates shared by every geometric routine.

use nalgebra::{Point2, Vector2};

/// Relative tolerance used by all predicates.
pub const EPS: f64 = 1e-9;

#[inline]
pub fn cross(u: Vector2<f64>, v: Vector2<f64>) -> f64 {
    u.x * v.y - u.y * v.x
}

/// Twice the signed area of the triangle `(a, b, c)`; positive for a left turn.
#[inline]
pub fn orient2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    cross(b - a, c - a)
}

/// Sign of [`orient2d`] with a tolerance relative to the edge lengths.
///
/// Returns `1` for a left turn, `-1` for a right turn and `0` when the three
/// points are collinear up to `EPS` in the sine of the enclosed angle.
pub fn orientation(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> i8 {
    let u = b - a;
    let v = c - a;
    let det = cross(u, v);
    let tol = EPS * u.norm() * v.norm();
    if det > tol {
        1
    } else if det < -tol {
        -1
    } else {
        0
    }
}

/// Parameter of the orthogonal projection of `p` onto the line through `a`, `b`.
#[inline]
pub fn project_param(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return 0.0;
    }
    (p - a).dot(&ab) / len2
}

/// Euclidean distance from `p` to the closed segment `[a, b]`.
pub fn distance_to_segment(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let t = project_param(p, a, b).clamp(0.0, 1.0);
    let q = a + (b - a) * t;
    (p - q).norm()
}

/// True when the open segments `(a, b)` and `(c, d)` cross at a single interior point.
pub fn segments_cross(
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    d: &Point2<f64>,
) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);
    o1 * o2 < 0 && o3 * o4 < 0
}

/// True when the closed segments share at least one point (touching included).
pub fn segments_touch(
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    d: &Point2<f64>,
    tol: f64,
) -> bool {
    segments_cross(a, b, c, d)
        || distance_to_segment(a, c, d) <= tol
        || distance_to_segment(b, c, d) <= tol
        || distance_to_segment(c, a, b) <= tol
        || distance_to_segment(d, a, b) <= tol
}

/// Rotate `p` counter-clockwise about the origin.
#[inline]
pub fn rotate(p: &Point2<f64>, angle: f64) -> Point2<f64> {
    let (s, c) = angle.sin_cos();
    Point2::new(c * p.x - s * p.y, s * p.x + c * p.y)
}

/// Wrap an angle into `[0, π)`; sweep directions are unoriented.
pub fn wrap_half_turn(angle: f64) -> f64 {
    let pi = std::f64::consts::PI;
    let mut a = angle % pi;
    if a < 0.0 {
        a += pi;
    }
    if a >= pi {
        a -= pi;
    }
    a
}

/// Total Euclidean length of a polyline.
pub fn polyline_length(path: &[Point2<f64>]) -> f64 {
    path.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}
