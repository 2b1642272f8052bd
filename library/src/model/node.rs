//! Graph node — wraps one operation together with its pads and configuration.

use uuid::Uuid;

use super::pad::{PadDefinition, PadDirection};
use crate::error::GraphError;
use crate::operation::Operation;
use crate::operation::config::Config;
use crate::operation::subgraph::{Subgraph, SubgraphBuilder};

/// A vertex in the connection graph.
///
/// The pad lists are fixed at construction from the operation's
/// declarations. A node whose operation is a meta-operation additionally
/// owns an internal [`Subgraph`] once `associate` has run.
pub struct Node {
    pub id: Uuid,
    inputs: Vec<PadDefinition>,
    outputs: Vec<PadDefinition>,
    pub config: Config,
    operation: Box<dyn Operation>,
    internal: Option<Subgraph>,
}

impl Node {
    pub fn new(operation: Box<dyn Operation>) -> Self {
        Self::with_config(operation, Config::new())
    }

    pub fn with_config(operation: Box<dyn Operation>, config: Config) -> Self {
        let pads = operation.pads();
        let (inputs, outputs): (Vec<_>, Vec<_>) = pads
            .into_iter()
            .partition(|p| p.direction == PadDirection::Input);
        Self {
            id: Uuid::new_v4(),
            inputs,
            outputs,
            config,
            operation,
            internal: None,
        }
    }

    /// Operation type name, used for instrumentation and diagnostics.
    pub fn op_type(&self) -> &'static str {
        self.operation.op_type()
    }

    /// Input pads in declaration order.
    pub fn input_pads(&self) -> &[PadDefinition] {
        &self.inputs
    }

    pub fn output_pads(&self) -> &[PadDefinition] {
        &self.outputs
    }

    pub fn input_pad(&self, name: &str) -> Option<&PadDefinition> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output_pad(&self, name: &str) -> Option<&PadDefinition> {
        self.outputs.iter().find(|p| p.name == name)
    }

    pub fn operation(&self) -> &dyn Operation {
        self.operation.as_ref()
    }

    pub fn operation_mut(&mut self) -> &mut dyn Operation {
        self.operation.as_mut()
    }

    /// Whether this node expands into an internal subgraph.
    pub fn is_meta(&self) -> bool {
        self.operation.is_meta()
    }

    pub fn internal(&self) -> Option<&Subgraph> {
        self.internal.as_ref()
    }

    /// Build the internal subgraph if the operation is a meta-operation and
    /// it has not been built yet. Invoked lazily, at most once per node.
    pub(crate) fn ensure_associated(&mut self) -> Result<(), GraphError> {
        if self.operation.is_meta() && self.internal.is_none() {
            let mut builder = SubgraphBuilder::new();
            self.operation.associate(&mut builder)?;
            self.internal = Some(builder.finish());
        }
        Ok(())
    }

    /// Run the operation's `prepare` against the node's current
    /// configuration, handing meta-operations their internal graph.
    pub(crate) fn run_prepare(&mut self) -> Result<(), GraphError> {
        let unknown: Vec<&str> = self
            .config
            .keys()
            .filter(|k| !self.operation.config_keys().contains(&k.as_str()))
            .map(|k| k.as_str())
            .collect();
        if !unknown.is_empty() {
            log::warn!(
                "operation '{}' ignores unknown config keys: {}",
                self.operation.op_type(),
                unknown.join(", ")
            );
        }
        self.operation.prepare(&self.config, self.internal.as_mut())
    }

    /// Temporarily detach the internal subgraph so the evaluation visitor
    /// can recurse into it without holding a borrow on this node.
    pub(crate) fn take_internal(&mut self) -> Option<Subgraph> {
        self.internal.take()
    }

    pub(crate) fn put_internal(&mut self, subgraph: Subgraph) {
        self.internal = Some(subgraph);
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("op_type", &self.op_type())
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .field("meta", &self.is_meta())
            .finish()
    }
}
