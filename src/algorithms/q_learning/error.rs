use thiserror::Error;

use super::types::TaskKind;
use crate::{Floor, RiderId};

/// Errors raised by the dispatcher's public operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No {kind} task registered for rider {rider_id}")]
    TaskNotFound { rider_id: RiderId, kind: TaskKind },

    #[error("Floor {floor} is outside the served range 1..={max_floor}")]
    InvalidFloor { floor: Floor, max_floor: u32 },

    #[error("Invalid dispatcher configuration: {0}")]
    InvalidConfig(String),

    #[error("Model store error: {0}")]
    Model(#[from] ModelError),
}

/// Errors raised while loading or saving the persisted model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("No stored model available")]
    Unavailable,

    #[error("Stored model is corrupt: {0}")]
    Corrupt(String),

    #[error("Stored table has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Failed to encode model: {0}")]
    Encode(String),

    #[error("Model store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    /// Whether the dispatcher may discard the stored model and start fresh.
    ///
    /// Missing, undecodable and shape-incompatible models qualify; any other
    /// I/O failure does not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ModelError::Unavailable | ModelError::Corrupt(_) | ModelError::ShapeMismatch { .. }
        )
    }
}
