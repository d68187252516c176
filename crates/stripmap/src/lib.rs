//! Coverage path planning for polygons with holes.
//!
//! This crate re-exports the workspace crates and adds the outer layer:
//! JSON instance and configuration files, run metrics and the `stripmap`
//! command-line tool.
//!
//! ```
//! use nalgebra::Point2;
//! use stripmap::{report, PlanConfig, PolygonWithHoles};
//!
//! let p = |x: f64, y: f64| Point2::new(x, y);
//! let field =
//!     PolygonWithHoles::from_outer(vec![p(0.0, 0.0), p(9.0, 0.0), p(9.0, 6.0), p(0.0, 6.0)])
//!         .unwrap();
//! let outcome = report::run(&PlanConfig::default(), field).unwrap();
//! assert_eq!(outcome.metrics.cell_count, 1);
//! ```

pub mod config;
pub mod io;
pub mod report;

pub use stripmap_core as core;
pub use stripmap_decomposition as decomposition;
pub use stripmap_gtsp as gtsp;
pub use stripmap_planner as planner;
pub use stripmap_sweep as sweep;

pub use config::{CostConfig, CostKind, PlanConfig, SensorConfig};
pub use io::{load_instance, InstanceFile, IoError};
pub use report::{BenchReport, PlanMetrics, PlanOutcome};
pub use stripmap_core::{Phase, PolygonWithHoles, Timings};
pub use stripmap_planner::{Planner, PlannerParams, PlannerVariant, Settings, Solution};

use stripmap_core::{CostError, SensorError};
use stripmap_planner::{SetupError, SolveError};

/// Any failure of a configured planning run.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Sensor(#[from] SensorError),
    #[error(transparent)]
    Cost(#[from] CostError),
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),
    #[error("solve failed: {0}")]
    Solve(#[from] SolveError),
}

/// Route `log` records into `tracing` and install the formatted subscriber.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let _ = tracing_log::LogTracer::init();
    stripmap_core::init_tracing(json);
}
