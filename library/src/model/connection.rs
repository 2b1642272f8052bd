//! Connection model for the data-flow graph.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pad::PadId;

/// A directed connection between an output pad and an input pad.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Connection {
    pub id: Uuid,
    /// Source pad (output)
    pub from: PadId,
    /// Destination pad (input)
    pub to: PadId,
}

impl Connection {
    pub fn new(from: PadId, to: PadId) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
        }
    }
}
