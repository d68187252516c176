/// Errors returned by the decomposers.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecompositionError {
    #[error("sweep direction must be finite (got {0})")]
    InvalidDirection(f64),
    #[error("face tracing did not close at node {node}")]
    OpenFace { node: usize },
    #[error("cell areas sum to {actual}, free space has area {expected}")]
    AreaMismatch { expected: f64, actual: f64 },
    #[error("cells form {components} disconnected groups")]
    Disconnected { components: usize },
    #[error("decomposition produced no cells")]
    NoCells,
}
