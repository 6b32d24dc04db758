//! Error types for the simulation core.

use thiserror::Error;

/// Errors raised by the simulation core.
///
/// Everything here is a construction-time or caller contract violation;
/// numeric edge cases inside a tick are handled by branching instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Actor configuration names a physics model that does not exist.
    #[error("unknown physics model: {0}")]
    UnknownPhysicsModel(String),

    /// Physics model is missing a parameter it cannot run without.
    #[error("physics model `{model}` requires parameter `{param}`")]
    MissingParameter {
        /// Model name.
        model: &'static str,
        /// Missing parameter name.
        param: &'static str,
    },

    /// Telemetry timestamp is not a finite number.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(f64),

    /// Telemetry arrived without a pose.
    #[error("pose is required")]
    MissingPose,

    /// Two actors share a name within one simulation.
    #[error("duplicate actor name: {0}")]
    DuplicateActor(String),

    /// No actor with this name exists in the simulation.
    #[error("unknown actor: {0}")]
    UnknownActor(String),

    /// No level with this name exists in the catalogue.
    #[error("unknown level: {0}")]
    UnknownLevel(String),
}

/// Result alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
