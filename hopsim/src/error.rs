use thiserror::Error;

/// Everything that can stop a simulation from producing a histogram.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The requested node/neighbour counts cannot form a connected network.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("could not build a connected network in {attempts} attempts")]
    GraphConstruction { attempts: usize },

    /// A defect in the engine itself. Never expected under correct locking.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    #[error("failed to spawn sensor thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl SimulationError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    pub(crate) fn violation(reason: impl Into<String>) -> Self {
        Self::InternalInvariantViolation(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
