//! Path cost functions.
//!
//! A single [`PathCost`] instance scores both the sweep-plan graph edges and
//! the final assembled path, so solver decisions and reported costs agree.

use crate::predicates::polyline_length;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CostError {
    #[error("v_max must be finite and > 0 (got {0})")]
    InvalidVelocity(f64),
    #[error("a_max must be finite and > 0 (got {0})")]
    InvalidAcceleration(f64),
}

/// Scores a polyline. Implementations must be pure functions of the input.
pub trait PathCost: Send + Sync {
    fn cost(&self, path: &[Point2<f64>]) -> f64;
}

/// Travel time under a trapezoidal velocity profile, stopping at every vertex.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VelocityRampCost {
    v_max: f64,
    a_max: f64,
}

impl VelocityRampCost {
    pub fn new(v_max: f64, a_max: f64) -> Result<Self, CostError> {
        if !v_max.is_finite() || v_max <= 0.0 {
            return Err(CostError::InvalidVelocity(v_max));
        }
        if !a_max.is_finite() || a_max <= 0.0 {
            return Err(CostError::InvalidAcceleration(a_max));
        }
        Ok(Self { v_max, a_max })
    }

    #[inline]
    pub fn v_max(&self) -> f64 {
        self.v_max
    }

    #[inline]
    pub fn a_max(&self) -> f64 {
        self.a_max
    }
}

impl PathCost for VelocityRampCost {
    fn cost(&self, path: &[Point2<f64>]) -> f64 {
        velocity_ramp_cost(path, self.v_max, self.a_max)
    }
}

/// Plain Euclidean length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EuclideanCost;

impl PathCost for EuclideanCost {
    fn cost(&self, path: &[Point2<f64>]) -> f64 {
        euclidean_cost(path)
    }
}

/// Adapter turning any closure into a [`PathCost`].
pub struct FnCost<F>(pub F);

impl<F> PathCost for FnCost<F>
where
    F: Fn(&[Point2<f64>]) -> f64 + Send + Sync,
{
    fn cost(&self, path: &[Point2<f64>]) -> f64 {
        (self.0)(path)
    }
}

/// Time to traverse `d` from rest to rest with bounded velocity and acceleration.
#[inline]
pub fn segment_ramp_time(d: f64, v_max: f64, a_max: f64) -> f64 {
    if d >= v_max * v_max / a_max {
        d / v_max + v_max / a_max
    } else {
        2.0 * (d / a_max).sqrt()
    }
}

/// Sum of [`segment_ramp_time`] over every segment of `path`.
pub fn velocity_ramp_cost(path: &[Point2<f64>], v_max: f64, a_max: f64) -> f64 {
    path.windows(2)
        .map(|w| segment_ramp_time((w[1] - w[0]).norm(), v_max, a_max))
        .sum()
}

#[inline]
pub fn euclidean_cost(path: &[Point2<f64>]) -> f64 {
    polyline_length(path)
}
