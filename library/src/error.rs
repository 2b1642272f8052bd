use thiserror::Error;
use uuid::Uuid;

use crate::model::pad::PadId;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("connection {from} -> {to} would create a cycle")]
    Cycle { from: PadId, to: PadId },
    #[error("input pad {0} already has a connection")]
    AlreadyConnected(PadId),
    #[error("node not found: {0}")]
    NodeNotFound(Uuid),
    #[error("pad not found: {0}")]
    PadNotFound(PadId),
    #[error("operation '{operation}' failed computing '{pad}': {message}")]
    Compute {
        operation: String,
        pad: String,
        message: String,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl GraphError {
    /// Shorthand for operation compute failures.
    pub fn compute(
        operation: impl Into<String>,
        pad: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        GraphError::Compute {
            operation: operation.into(),
            pad: pad.into(),
            message: message.into(),
        }
    }
}
