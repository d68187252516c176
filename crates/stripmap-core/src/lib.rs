//! Core types and utilities for polygon coverage planning.
//!
//! This crate is purely geometric: polygons with holes, tolerance-aware
//! predicates, a reduced visibility graph, sensor footprints and path cost
//! models. It knows nothing about decomposition or tour solving.

mod cost;
mod logger;
mod polygon;
mod predicates;
mod ring;
mod sensor;
mod timing;
mod visibility;

pub use cost::{
    euclidean_cost, segment_ramp_time, velocity_ramp_cost, CostError, EuclideanCost, FnCost,
    PathCost, VelocityRampCost,
};
pub use polygon::{GeometryError, PolygonWithHoles, RingId};
pub use predicates::{
    cross, distance_to_segment, orient2d, orientation, polyline_length, project_param, rotate,
    segments_cross, segments_touch, wrap_half_turn, EPS,
};
pub use ring::{Containment, Ring};
pub use sensor::{chord_count, Line, SensorError, SensorModel};
pub use timing::{Phase, Timings};
pub use visibility::VisibilityGraph;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, LOG_ENV};

/// Shorthand for the point type used throughout the workspace.
pub type Point = nalgebra::Point2<f64>;
