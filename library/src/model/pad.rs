//! Pads — named, typed sockets on nodes.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value-type descriptor for a pad (socket type).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PadFormat {
    /// Pixel buffer flow
    Image,
    /// Floating point scalar
    Scalar,
    /// Accepts any format (boundary proxies, generic pass-through)
    Any,
}

impl PadFormat {
    /// Whether a connection between two pad formats is allowed.
    pub fn compatible(self, other: PadFormat) -> bool {
        self == other || self == PadFormat::Any || other == PadFormat::Any
    }
}

/// Direction of a pad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PadDirection {
    Input,
    Output,
}

/// Definition of a pad on a node, declared by the node's operation.
#[derive(Clone, Debug)]
pub struct PadDefinition {
    /// Name used for connections (e.g. "input", "aux", "output")
    pub name: String,
    pub direction: PadDirection,
    pub format: PadFormat,
}

impl PadDefinition {
    pub fn input(name: &str, format: PadFormat) -> Self {
        Self {
            name: name.to_string(),
            direction: PadDirection::Input,
            format,
        }
    }

    pub fn output(name: &str, format: PadFormat) -> Self {
        Self {
            name: name.to_string(),
            direction: PadDirection::Output,
            format,
        }
    }
}

/// Identifies a specific pad on a specific node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PadId {
    pub node_id: Uuid,
    pub pad_name: String,
}

impl PadId {
    pub fn new(node_id: Uuid, pad_name: &str) -> Self {
        Self {
            node_id,
            pad_name: pad_name.to_string(),
        }
    }
}

impl fmt::Display for PadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node_id, self.pad_name)
    }
}
