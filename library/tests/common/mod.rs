//! Shared mock operations for the integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use library::buffer::{Buffer, BufferData};
use library::error::GraphError;
use library::model::pad::{PadDefinition, PadFormat};
use library::operation::subgraph::SubgraphBuilder;
use library::operation::{InputBuffers, Operation};

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Order of compute calls across all recording ops sharing the log.
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls_for(log: &CallLog, label: &str) -> usize {
    log.lock().unwrap().iter().filter(|l| **l == label).count()
}

/// One-pixel buffer carrying a single value in all four channels.
pub fn value_buffer(value: f32) -> Buffer {
    Buffer::new(BufferData::from_pixels(1, 1, vec![value; 4]))
}

pub fn first_pixel(buffer: &Buffer) -> Option<f32> {
    buffer.with_data(|d| d.pixels[0])
}

/// Mock operation that records its compute calls and produces
/// `1 + sum(first pixel of each live input)`, so data flow is observable in
/// the result: a prematurely freed input would change the sum.
pub struct RecordingOp {
    label: &'static str,
    log: CallLog,
    input_names: Vec<&'static str>,
    /// Clones of every buffer this op produced, for release assertions.
    pub produced: Arc<Mutex<Vec<Buffer>>>,
}

impl RecordingOp {
    /// A source: no inputs, computes 1.0.
    pub fn source(label: &'static str, log: &CallLog) -> Self {
        Self::with_inputs(label, log, &[])
    }

    /// A filter with a single "input" pad.
    pub fn filter(label: &'static str, log: &CallLog) -> Self {
        Self::with_inputs(label, log, &["input"])
    }

    pub fn with_inputs(label: &'static str, log: &CallLog, inputs: &[&'static str]) -> Self {
        Self {
            label,
            log: log.clone(),
            input_names: inputs.to_vec(),
            produced: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn produced_handle(&self) -> Arc<Mutex<Vec<Buffer>>> {
        self.produced.clone()
    }
}

impl Operation for RecordingOp {
    fn op_type(&self) -> &'static str {
        self.label
    }

    fn pads(&self) -> Vec<PadDefinition> {
        let mut pads: Vec<PadDefinition> = self
            .input_names
            .iter()
            .map(|name| PadDefinition::input(name, PadFormat::Image))
            .collect();
        pads.push(PadDefinition::output("output", PadFormat::Image));
        pads
    }

    fn compute(&mut self, _output_pad: &str, inputs: &InputBuffers)
    -> Result<Buffer, GraphError> {
        self.log.lock().unwrap().push(self.label);
        let mut value = 1.0f32;
        for name in &self.input_names {
            if let Some(px) = inputs.get(*name).and_then(first_pixel) {
                value += px;
            }
        }
        let buffer = value_buffer(value);
        self.produced.lock().unwrap().push(buffer.clone());
        Ok(buffer)
    }
}

/// Always fails to compute.
pub struct FailingOp;

impl Operation for FailingOp {
    fn op_type(&self) -> &'static str {
        "failing"
    }

    fn pads(&self) -> Vec<PadDefinition> {
        vec![
            PadDefinition::input("input", PadFormat::Image),
            PadDefinition::output("output", PadFormat::Image),
        ]
    }

    fn compute(&mut self, output_pad: &str, _inputs: &InputBuffers)
    -> Result<Buffer, GraphError> {
        Err(GraphError::compute("failing", output_pad, "simulated failure"))
    }
}

/// Produces an empty buffer, simulating an upstream that could not deliver.
pub struct EmptyOp;

impl Operation for EmptyOp {
    fn op_type(&self) -> &'static str {
        "empty"
    }

    fn pads(&self) -> Vec<PadDefinition> {
        vec![PadDefinition::output("output", PadFormat::Image)]
    }

    fn compute(&mut self, _output_pad: &str, _inputs: &InputBuffers)
    -> Result<Buffer, GraphError> {
        Ok(Buffer::empty())
    }
}

/// Minimal meta-operation: `input → inner filter → output`, with an
/// associate counter to verify one-time expansion.
pub struct TinyMeta {
    log: CallLog,
    pub associate_calls: Arc<Mutex<usize>>,
    /// Extra meta level: wrap the inner filter in another TinyMeta.
    nested: bool,
}

impl TinyMeta {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            associate_calls: Arc::new(Mutex::new(0)),
            nested: false,
        }
    }

    pub fn nested(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            associate_calls: Arc::new(Mutex::new(0)),
            nested: true,
        }
    }
}

impl Operation for TinyMeta {
    fn op_type(&self) -> &'static str {
        "tiny-meta"
    }

    fn pads(&self) -> Vec<PadDefinition> {
        vec![
            PadDefinition::input("input", PadFormat::Image),
            PadDefinition::output("output", PadFormat::Image),
        ]
    }

    fn associate(&mut self, builder: &mut SubgraphBuilder) -> Result<(), GraphError> {
        *self.associate_calls.lock().unwrap() += 1;

        let input = builder.boundary_input("input");
        let output = builder.boundary_output("output");
        let inner: Box<dyn Operation> = if self.nested {
            Box::new(TinyMeta::new(&self.log))
        } else {
            Box::new(RecordingOp::filter("inner", &self.log))
        };
        let inner = builder.add_node(library::model::Node::new(inner));

        builder.connect(input, "output", inner, "input")?;
        builder.connect(inner, "output", output, "input")?;
        Ok(())
    }

    fn compute(&mut self, output_pad: &str, _inputs: &InputBuffers)
    -> Result<Buffer, GraphError> {
        Err(GraphError::compute(
            "tiny-meta",
            output_pad,
            "meta-operation has no direct compute",
        ))
    }

    fn is_meta(&self) -> bool {
        true
    }
}
