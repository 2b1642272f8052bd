//! Internal subgraphs behind meta-operations.
//!
//! `associate` builds a private [`ConnectionGraph`] whose boundary proxy
//! nodes alias the external pads of the owning node. A proxy is an ordinary
//! pass-through node; the evaluation visitor seeds input proxies with the
//! outer node's resolved input buffers and pulls the external output from
//! the output proxy, so external callers cannot distinguish a meta-node
//! from a primitive one.

use std::collections::HashMap;

use uuid::Uuid;

use super::{InputBuffers, Operation};
use crate::buffer::Buffer;
use crate::error::GraphError;
use crate::model::graph::ConnectionGraph;
use crate::model::node::Node;
use crate::model::pad::{PadDefinition, PadFormat, PadId};

pub(crate) const PROXY_OP_TYPE: &str = "proxy";

/// Pass-through node standing in for one external pad inside a subgraph.
///
/// An input proxy's output is normally seeded by the visitor before the
/// internal graph is resolved; when the outer pad is unconnected the proxy
/// computes an empty buffer instead, which downstream nodes tolerate.
struct ProxyOperation;

impl Operation for ProxyOperation {
    fn op_type(&self) -> &'static str {
        PROXY_OP_TYPE
    }

    fn pads(&self) -> Vec<PadDefinition> {
        vec![
            PadDefinition::input("input", PadFormat::Any),
            PadDefinition::output("output", PadFormat::Any),
        ]
    }

    fn compute(&mut self, _output_pad: &str, inputs: &InputBuffers)
    -> Result<Buffer, GraphError> {
        Ok(match inputs.get("input") {
            Some(buffer) => buffer.acquire(),
            None => Buffer::empty(),
        })
    }
}

/// A meta-node's internal connection graph plus its boundary mapping
/// (external pad name → proxy node id).
pub struct Subgraph {
    graph: ConnectionGraph,
    inputs: HashMap<String, Uuid>,
    outputs: HashMap<String, Uuid>,
}

impl Subgraph {
    pub fn graph(&self) -> &ConnectionGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut ConnectionGraph {
        &mut self.graph
    }

    /// Proxy node backing an external input pad.
    pub fn input_proxy(&self, pad_name: &str) -> Option<Uuid> {
        self.inputs.get(pad_name).copied()
    }

    /// Proxy node backing an external output pad.
    pub fn output_proxy(&self, pad_name: &str) -> Option<Uuid> {
        self.outputs.get(pad_name).copied()
    }

    /// Point `to` at `from`, replacing any existing connection. Idempotent:
    /// if `to` is already fed by `from` the wiring is left untouched, so
    /// repeated `prepare` calls with an unchanged config do not churn
    /// consumer counts.
    pub fn rewire(&mut self, from: PadId, to: PadId) -> Result<(), GraphError> {
        if self.graph.upstream(&to).as_ref() == Some(&from) {
            return Ok(());
        }
        self.graph.disconnect(&to);
        self.graph.connect(from, to)
    }
}

/// Builder handed to `associate` for constructing the internal graph.
pub struct SubgraphBuilder {
    graph: ConnectionGraph,
    inputs: HashMap<String, Uuid>,
    outputs: HashMap<String, Uuid>,
}

impl SubgraphBuilder {
    pub(crate) fn new() -> Self {
        Self {
            graph: ConnectionGraph::new(),
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        }
    }

    /// Create the boundary proxy for an external input pad and return its
    /// node id. The proxy's "output" pad feeds the internal graph.
    pub fn boundary_input(&mut self, pad_name: &str) -> Uuid {
        let id = self.graph.add_node(Node::new(Box::new(ProxyOperation)));
        self.inputs.insert(pad_name.to_string(), id);
        id
    }

    /// Create the boundary proxy for an external output pad. The proxy's
    /// "input" pad collects the internal graph's result.
    pub fn boundary_output(&mut self, pad_name: &str) -> Uuid {
        let id = self.graph.add_node(Node::new(Box::new(ProxyOperation)));
        self.outputs.insert(pad_name.to_string(), id);
        id
    }

    /// Add an internal node.
    pub fn add_node(&mut self, node: Node) -> Uuid {
        self.graph.add_node(node)
    }

    /// Connect internal pads by node id and pad name.
    pub fn connect(
        &mut self,
        from_node: Uuid,
        from_pad: &str,
        to_node: Uuid,
        to_pad: &str,
    ) -> Result<(), GraphError> {
        self.graph
            .connect(PadId::new(from_node, from_pad), PadId::new(to_node, to_pad))
    }

    /// Mutable access to an internal node, e.g. to seed its config.
    pub fn node_mut(&mut self, node_id: Uuid) -> Result<&mut Node, GraphError> {
        self.graph.node_mut(node_id)
    }

    pub(crate) fn finish(self) -> Subgraph {
        Subgraph {
            graph: self.graph,
            inputs: self.inputs,
            outputs: self.outputs,
        }
    }
}

/// Whether a node is a boundary proxy (used by the visitor to tell "not yet
/// wired" apart from a genuinely missing buffer).
pub(crate) fn is_proxy(node: &Node) -> bool {
    node.op_type() == PROXY_OP_TYPE
}
