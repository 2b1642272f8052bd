//! Connection graph — mutable registry of nodes and pad-to-pad connections.
//!
//! The graph enforces the DAG invariant at mutation time: a connection that
//! would close a cycle is rejected and leaves the graph unchanged. No
//! buffers are touched by structural mutation; evaluation state lives in the
//! visitor.

use std::collections::{HashMap, HashSet, VecDeque};

use uuid::Uuid;

use super::connection::Connection;
use super::node::Node;
use super::pad::PadId;
use crate::error::GraphError;

#[derive(Default)]
pub struct ConnectionGraph {
    nodes: HashMap<Uuid, Node>,
    connections: Vec<Connection>,
    /// Number of input pads connected to each output pad.
    consumer_counts: HashMap<PadId, usize>,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its id.
    pub fn add_node(&mut self, node: Node) -> Uuid {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node together with all connections touching it.
    pub fn remove_node(&mut self, node_id: Uuid) -> Result<Node, GraphError> {
        let node = self
            .nodes
            .remove(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        let detached: Vec<PadId> = self
            .connections
            .iter()
            .filter(|c| c.to.node_id == node_id)
            .map(|c| c.from.clone())
            .collect();
        for from in detached {
            self.decrement_consumers(&from);
        }
        self.connections
            .retain(|c| c.from.node_id != node_id && c.to.node_id != node_id);
        self.consumer_counts.retain(|pad, _| pad.node_id != node_id);
        Ok(node)
    }

    pub fn node(&self, node_id: Uuid) -> Result<&Node, GraphError> {
        self.nodes.get(&node_id).ok_or(GraphError::NodeNotFound(node_id))
    }

    pub fn node_mut(&mut self, node_id: Uuid) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Connect an output pad to an input pad.
    ///
    /// Validates that both pads exist with the right directions and
    /// compatible formats, that the input is still free, and that the new
    /// edge keeps the graph acyclic. On success the source pad's consumer
    /// count is incremented.
    pub fn connect(&mut self, from: PadId, to: PadId) -> Result<(), GraphError> {
        let source_node = self.node(from.node_id)?;
        let source_pad = source_node
            .output_pad(&from.pad_name)
            .ok_or_else(|| GraphError::PadNotFound(from.clone()))?;
        let dest_node = self.node(to.node_id)?;
        let dest_pad = dest_node
            .input_pad(&to.pad_name)
            .ok_or_else(|| GraphError::PadNotFound(to.clone()))?;

        if !source_pad.format.compatible(dest_pad.format) {
            return Err(GraphError::InvalidArgument(format!(
                "incompatible pad formats: {} ({:?}) -> {} ({:?})",
                from, source_pad.format, to, dest_pad.format
            )));
        }
        if from.node_id == to.node_id {
            return Err(GraphError::InvalidArgument(
                "cannot connect a node to itself".to_string(),
            ));
        }
        if self.connections.iter().any(|c| c.to == to) {
            return Err(GraphError::AlreadyConnected(to));
        }
        if self.would_create_cycle(from.node_id, to.node_id) {
            return Err(GraphError::Cycle { from, to });
        }

        *self.consumer_counts.entry(from.clone()).or_insert(0) += 1;
        self.connections.push(Connection::new(from, to));
        Ok(())
    }

    /// Remove the connection feeding `to`, if any. Returns whether a
    /// connection was removed.
    pub fn disconnect(&mut self, to: &PadId) -> bool {
        let Some(pos) = self.connections.iter().position(|c| &c.to == to) else {
            return false;
        };
        let conn = self.connections.remove(pos);
        self.decrement_consumers(&conn.from);
        true
    }

    /// The output pad feeding a given input pad, if connected.
    pub fn upstream(&self, to: &PadId) -> Option<PadId> {
        self.connections
            .iter()
            .find(|c| &c.to == to)
            .map(|c| c.from.clone())
    }

    /// All input pads fed by a given output pad (fan-out).
    pub fn downstream(&self, from: &PadId) -> Vec<PadId> {
        self.connections
            .iter()
            .filter(|c| &c.from == from)
            .map(|c| c.to.clone())
            .collect()
    }

    /// Number of input pads currently connected to an output pad.
    pub fn consumer_count(&self, pad: &PadId) -> usize {
        self.consumer_counts.get(pad).copied().unwrap_or(0)
    }

    /// Check if connecting from_node -> to_node would create a cycle.
    /// Returns true if from_node is already reachable from to_node.
    fn would_create_cycle(&self, from_node: Uuid, to_node: Uuid) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(to_node);

        while let Some(current) = queue.pop_front() {
            if current == from_node {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for conn in &self.connections {
                if conn.from.node_id == current {
                    queue.push_back(conn.to.node_id);
                }
            }
        }
        false
    }

    fn decrement_consumers(&mut self, pad: &PadId) {
        if let Some(count) = self.consumer_counts.get_mut(pad) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.consumer_counts.remove(pad);
            }
        }
    }
}
