use rw_core::{CoreError, EntityId};

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised while running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The entity is not registered in the simulated world.
    #[error("entity not found in simulation: {0}")]
    EntityNotFound(EntityId),

    /// A script named a behavior the engine does not know.
    #[error("no behavior registered under \"{0}\"")]
    BehaviorNotFound(String),

    /// A path search target could not be resolved or lies in another area.
    #[error("invalid path target: {0}")]
    InvalidTarget(String),

    /// A script value has a shape the engine cannot run or save.
    #[error("invalid script: {0}")]
    InvalidScript(String),

    /// A script was run with no arguments at all.
    #[error("script has no arguments")]
    EmptyScript,

    /// An error from the world model.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A snapshot could not be serialized or parsed.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}
