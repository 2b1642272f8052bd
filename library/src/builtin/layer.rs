//! Layer meta-operation — a layer in the traditional sense.
//!
//! Expands into the internal chain `source → opacity → shift → over(aux)`,
//! with `input`/`aux`/`output` boundaries. When the `src` config points at
//! an asset, the layer content comes from a cached load of that asset; when
//! `src` is empty the content is pulled from the layer's own `aux` input
//! instead.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::composite::Over;
use super::filters::{Opacity, Shift};
use super::source::{BufferSource, SourceSlot};
use crate::buffer::Buffer;
use crate::error::GraphError;
use crate::model::node::Node;
use crate::model::pad::{PadDefinition, PadFormat, PadId};
use crate::operation::config::Config;
use crate::operation::subgraph::{Subgraph, SubgraphBuilder};
use crate::operation::{InputBuffers, Operation};

/// External collaborator producing a buffer for an asset path.
pub trait AssetLoader {
    fn load(&mut self, path: &str) -> Result<Buffer, GraphError>;
}

impl<F> AssetLoader for F
where
    F: FnMut(&str) -> Result<Buffer, GraphError>,
{
    fn load(&mut self, path: &str) -> Result<Buffer, GraphError> {
        self(path)
    }
}

/// Internal node ids captured during `associate`.
struct LayerNodes {
    aux: Uuid,
    source: Uuid,
    opacity: Uuid,
    shift: Uuid,
}

pub struct Layer {
    loader: Box<dyn AssetLoader>,
    /// Writing end of the internal source node's slot.
    slot: SourceSlot,
    nodes: Option<LayerNodes>,
    cached_path: Option<String>,
    cached_buffer: Option<Buffer>,
}

impl Layer {
    pub fn new(loader: Box<dyn AssetLoader>) -> Self {
        Self {
            loader,
            slot: Arc::new(Mutex::new(None)),
            nodes: None,
            cached_path: None,
            cached_buffer: None,
        }
    }

    /// Reload the cached asset if there is none yet or the path changed.
    /// The whole cache is invalidated on a key change; the old buffer is
    /// released before the new one is loaded.
    fn refresh_cache(&mut self, src: &str) -> Result<(), GraphError> {
        let fresh = self.cached_buffer.is_some()
            && self.cached_path.as_deref() == Some(src);
        if fresh {
            return Ok(());
        }
        if let Some(old) = self.cached_buffer.take() {
            old.release();
            self.cached_path = None;
        }
        self.cached_buffer = Some(self.loader.load(src)?);
        self.cached_path = Some(src.to_string());
        Ok(())
    }
}

impl Operation for Layer {
    fn op_type(&self) -> &'static str {
        "layer"
    }

    fn pads(&self) -> Vec<PadDefinition> {
        vec![
            PadDefinition::input("input", PadFormat::Image),
            PadDefinition::input("aux", PadFormat::Image),
            PadDefinition::output("output", PadFormat::Image),
        ]
    }

    fn config_keys(&self) -> &'static [&'static str] {
        &["src", "opacity", "x", "y"]
    }

    fn associate(&mut self, builder: &mut SubgraphBuilder) -> Result<(), GraphError> {
        let input = builder.boundary_input("input");
        let aux = builder.boundary_input("aux");
        let output = builder.boundary_output("output");

        let source = builder.add_node(Node::new(Box::new(BufferSource::shared(
            self.slot.clone(),
        ))));
        let opacity = builder.add_node(Node::new(Box::new(Opacity::default())));
        let shift = builder.add_node(Node::new(Box::new(Shift::default())));
        let composite = builder.add_node(Node::new(Box::new(Over)));

        builder.connect(source, "output", opacity, "input")?;
        builder.connect(opacity, "output", shift, "input")?;
        builder.connect(shift, "output", composite, "aux")?;
        builder.connect(input, "output", composite, "input")?;
        builder.connect(composite, "output", output, "input")?;

        self.nodes = Some(LayerNodes {
            aux,
            source,
            opacity,
            shift,
        });
        Ok(())
    }

    fn prepare(
        &mut self,
        config: &Config,
        internal: Option<&mut Subgraph>,
    ) -> Result<(), GraphError> {
        let internal = internal.ok_or_else(|| {
            GraphError::InvalidArgument("layer prepared without an internal graph".to_string())
        })?;

        let src = config.text("src").unwrap_or("").to_string();
        if !src.is_empty() {
            self.refresh_cache(&src)?;
            *self.slot.lock().unwrap() = self.cached_buffer.clone();
        }

        let nodes = self.nodes.as_ref().ok_or_else(|| {
            GraphError::InvalidArgument("layer prepared before associate".to_string())
        })?;

        // Chain head: cached asset when src is set, the aux boundary
        // otherwise. `rewire` is a no-op when the wiring already matches.
        let head = if src.is_empty() { nodes.aux } else { nodes.source };
        internal.rewire(
            PadId::new(head, "output"),
            PadId::new(nodes.opacity, "input"),
        )?;

        let graph = internal.graph_mut();
        graph
            .node_mut(nodes.opacity)?
            .config
            .set("value", config.number_or("opacity", 1.0));
        let shift = graph.node_mut(nodes.shift)?;
        shift.config.set("x", config.number_or("x", 0.0));
        shift.config.set("y", config.number_or("y", 0.0));
        Ok(())
    }

    fn compute(&mut self, output_pad: &str, _inputs: &InputBuffers)
    -> Result<Buffer, GraphError> {
        // Boundary pads resolve through the internal graph instead.
        Err(GraphError::compute(
            "layer",
            output_pad,
            "meta-operation has no direct compute",
        ))
    }

    fn is_meta(&self) -> bool {
        true
    }
}
