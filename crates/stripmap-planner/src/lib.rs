//! Coverage path planning over polygons with holes.
//!
//! The [`Planner`] runs the whole pipeline: decompose the free space into
//! cells, sweep each cell with parallel tracks, connect the tracks into a
//! sweep-plan graph and order them with the generalized TSP solver.
//!
//! ```
//! use std::sync::Arc;
//! use nalgebra::Point2;
//! use stripmap_core::{Line, PolygonWithHoles, Timings, VelocityRampCost};
//! use stripmap_planner::{Planner, PlannerParams, Settings};
//!
//! let p = |x: f64, y: f64| Point2::new(x, y);
//! let polygon =
//!     PolygonWithHoles::from_outer(vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)])
//!         .unwrap();
//! let settings = Settings::new(
//!     polygon,
//!     Arc::new(Line::new(3.0, 0.0).unwrap()),
//!     Arc::new(VelocityRampCost::new(3.0, 1.0).unwrap()),
//!     PlannerParams::default(),
//! );
//! let mut planner = Planner::new(settings);
//! let mut timings = Timings::new();
//! planner.setup(&mut timings).unwrap();
//! let solution = planner.solve(p(0.0, 0.0), p(0.0, 0.0), &mut timings).unwrap();
//! assert!(solution.cost > 0.0);
//! ```

mod error;
mod graph;
mod params;
mod planner;

pub use error::{GraphError, SetupError, SolveError};
pub use graph::{endpoints, oriented_points, AnchoredGraph, SweepPlanGraph, TransitRouter};
pub use params::{PlannerParams, PlannerVariant, Settings, TransitMode};
pub use planner::{Planner, PlannerState, Solution};
