use stripmap_core::{GeometryError, SensorError};
use stripmap_decomposition::DecompositionError;

/// Problems with the sweep-plan graph itself.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("cell {cell} has no transition to or from any other cell")]
    IsolatedCell { cell: usize },
}

/// Failures of [`crate::Planner::setup`]; no graph is retained after any of them.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SetupError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Decomposition(#[from] DecompositionError),
    #[error(transparent)]
    Sensor(#[from] SensorError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Failures of [`crate::Planner::solve`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("planner is not initialized, call setup first")]
    NotInitialized,
    #[error("start ({x}, {y}) lies outside the free space")]
    StartOutside { x: f64, y: f64 },
    #[error("goal ({x}, {y}) lies outside the free space")]
    GoalOutside { x: f64, y: f64 },
    #[error("no track can be reached from the start or reach the goal")]
    Unreachable,
    #[error("cells {cells:?} cannot be linked into a tour from start to goal")]
    Disconnected { cells: Vec<usize> },
    #[error("no cell order satisfies the available transitions")]
    Infeasible,
    #[error("solver time budget expired before a tour was found")]
    Timeout,
}

impl From<stripmap_gtsp::GtspError> for SolveError {
    fn from(err: stripmap_gtsp::GtspError) -> Self {
        use stripmap_gtsp::GtspError;
        match err {
            GtspError::Disconnected { clusters } => SolveError::Disconnected { cells: clusters },
            GtspError::Infeasible => SolveError::Infeasible,
            GtspError::Timeout => SolveError::Timeout,
        }
    }
}
