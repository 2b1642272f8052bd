//! Data model for the connection graph: pads, nodes, connections.

pub mod connection;
pub mod graph;
pub mod node;
pub mod pad;

pub use connection::Connection;
pub use graph::ConnectionGraph;
pub use node::Node;
pub use pad::{PadDefinition, PadDirection, PadFormat, PadId};
