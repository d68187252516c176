/// Failures of the tour search.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GtspError {
    #[error("clusters {clusters:?} cannot be reached from the start or cannot reach the goal")]
    Disconnected { clusters: Vec<usize> },
    #[error("no order visits every cluster with the available transitions")]
    Infeasible,
    #[error("time budget expired before any complete tour was found")]
    Timeout,
}
