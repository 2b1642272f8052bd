//! Source node handing an externally produced buffer into the graph.

use std::sync::{Arc, Mutex};

use crate::buffer::Buffer;
use crate::error::GraphError;
use crate::model::pad::{PadDefinition, PadFormat};
use crate::operation::{InputBuffers, Operation};

/// Shared slot a source reads from; a meta-operation can keep the writing
/// end to repoint its internal source at a freshly cached asset.
pub type SourceSlot = Arc<Mutex<Option<Buffer>>>;

/// Emits whatever buffer currently sits in its slot. The source keeps its
/// own reference to the asset; every `compute` hands out a fresh reference,
/// so the asset survives the per-pass release of its consumers.
pub struct BufferSource {
    slot: SourceSlot,
}

impl BufferSource {
    pub fn new(buffer: Buffer) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(buffer))),
        }
    }

    pub fn shared(slot: SourceSlot) -> Self {
        Self { slot }
    }
}

impl Operation for BufferSource {
    fn op_type(&self) -> &'static str {
        "source"
    }

    fn pads(&self) -> Vec<PadDefinition> {
        vec![PadDefinition::output("output", PadFormat::Image)]
    }

    fn compute(&mut self, _output_pad: &str, _inputs: &InputBuffers)
    -> Result<Buffer, GraphError> {
        Ok(match self.slot.lock().unwrap().as_ref() {
            Some(buffer) => buffer.acquire(),
            None => Buffer::empty(),
        })
    }
}
