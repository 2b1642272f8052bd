//! Operation trait — the polymorphic capability behind every node.

pub mod config;
pub mod subgraph;

use std::collections::HashMap;

pub use config::{Config, ConfigValue};
pub use subgraph::{Subgraph, SubgraphBuilder};

use crate::buffer::Buffer;
use crate::error::GraphError;
use crate::model::pad::PadDefinition;

/// Resolved input buffers for one `compute` call, keyed by input pad name.
/// Unconnected pads are simply absent.
pub type InputBuffers = HashMap<String, Buffer>;

/// Capability set implemented by every operation: `prepare`, `compute` and,
/// for meta-operations, `associate`.
///
/// A meta-operation is one that reports `is_meta()` and builds an internal
/// subgraph in `associate`; its `compute` is never called because the
/// evaluation visitor resolves its boundary pads through the internal graph
/// instead.
pub trait Operation {
    /// Operation type name for instrumentation and diagnostics.
    fn op_type(&self) -> &'static str;

    /// Pads this operation exposes on its node.
    fn pads(&self) -> Vec<PadDefinition>;

    /// Config keys this operation understands; anything else in the node's
    /// config is reported at prepare time.
    fn config_keys(&self) -> &'static [&'static str] {
        &[]
    }

    /// Fix output state from the current configuration before computation.
    ///
    /// Runs once per evaluation pass. Meta-operations receive their internal
    /// subgraph and may reconfigure or rewire internal nodes; repeated calls
    /// with an unchanged config must leave internal wiring and cached state
    /// unchanged.
    fn prepare(
        &mut self,
        config: &Config,
        internal: Option<&mut Subgraph>,
    ) -> Result<(), GraphError> {
        let _ = (config, internal);
        Ok(())
    }

    /// Produce the buffer for one named output pad from the resolved inputs.
    fn compute(&mut self, output_pad: &str, inputs: &InputBuffers)
    -> Result<Buffer, GraphError>;

    /// Build the internal subgraph. Only meta-operations implement this; it
    /// is invoked lazily and exactly once per node instance.
    fn associate(&mut self, builder: &mut SubgraphBuilder) -> Result<(), GraphError> {
        let _ = builder;
        Ok(())
    }

    /// Whether `associate` is present, i.e. this node expands into a
    /// subgraph.
    fn is_meta(&self) -> bool {
        false
    }
}
