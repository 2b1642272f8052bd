//! Subgraph expansion: transparency of meta-nodes, boundary seeding, and
//! the layer operation's keyed asset cache.

mod common;

use std::sync::{Arc, Mutex};

use library::buffer::{Buffer, BufferData};
use library::builtin::composite::Over;
use library::builtin::filters::{Opacity, Shift};
use library::builtin::layer::Layer;
use library::builtin::source::BufferSource;
use library::evaluation::EvalVisitor;
use library::model::pad::PadId;
use library::model::{ConnectionGraph, Node};
use library::operation::Config;

use common::{RecordingOp, TinyMeta, calls_for, first_pixel, init_logs, new_log};

fn asset_data() -> BufferData {
    BufferData::from_pixels(
        2,
        2,
        vec![
            0.1, 0.2, 0.3, 0.4, //
            0.5, 0.6, 0.7, 0.8, //
            0.9, 0.8, 0.7, 0.6, //
            0.5, 0.4, 0.3, 0.2,
        ],
    )
}

fn background_data() -> BufferData {
    BufferData::from_pixels(2, 2, vec![0.2; 16])
}

fn pixels(buffer: &Buffer) -> Vec<f32> {
    buffer.with_data(|d| d.pixels.clone()).unwrap()
}

#[test]
fn tiny_meta_is_transparent_and_associates_once() {
    init_logs();
    let log = new_log();
    let mut graph = ConnectionGraph::new();

    let meta_op = TinyMeta::new(&log);
    let associate_calls = meta_op.associate_calls.clone();

    let src = graph.add_node(Node::new(Box::new(RecordingOp::source("src", &log))));
    let meta = graph.add_node(Node::new(Box::new(meta_op)));
    graph
        .connect(PadId::new(src, "output"), PadId::new(meta, "input"))
        .unwrap();

    let target = PadId::new(meta, "output");
    let mut visitor = EvalVisitor::new();

    let result = visitor.evaluate(&mut graph, &target).unwrap();
    assert_eq!(first_pixel(&result), Some(2.0));
    result.release();

    // Second pass: the subgraph is reused, not rebuilt.
    let result = visitor.evaluate(&mut graph, &target).unwrap();
    assert_eq!(first_pixel(&result), Some(2.0));
    result.release();

    assert_eq!(*associate_calls.lock().unwrap(), 1);
    assert_eq!(calls_for(&log, "inner"), 2);
}

#[test]
fn nested_meta_resolves_recursively() {
    init_logs();
    let log = new_log();
    let mut graph = ConnectionGraph::new();

    let src = graph.add_node(Node::new(Box::new(RecordingOp::source("src", &log))));
    let meta = graph.add_node(Node::new(Box::new(TinyMeta::nested(&log))));
    graph
        .connect(PadId::new(src, "output"), PadId::new(meta, "input"))
        .unwrap();

    let mut visitor = EvalVisitor::new();
    let result = visitor
        .evaluate(&mut graph, &PadId::new(meta, "output"))
        .unwrap();
    assert_eq!(first_pixel(&result), Some(2.0));
    result.release();
}

#[test]
fn unwired_boundary_is_tolerated() {
    init_logs();
    let log = new_log();
    let mut graph = ConnectionGraph::new();
    // External "input" left unconnected: the boundary proxy delivers an
    // empty buffer and the pass still completes.
    let meta = graph.add_node(Node::new(Box::new(TinyMeta::new(&log))));

    let mut visitor = EvalVisitor::new();
    let result = visitor
        .evaluate(&mut graph, &PadId::new(meta, "output"))
        .unwrap();
    assert_eq!(first_pixel(&result), Some(1.0));
    result.release();
}

#[test]
fn layer_matches_hand_wired_primitives() {
    init_logs();

    // Meta: background → layer(input), layer sources its content from an
    // asset with opacity 0.5 shifted by one pixel.
    let mut meta_graph = ConnectionGraph::new();
    let bg = meta_graph.add_node(Node::new(Box::new(BufferSource::new(Buffer::new(
        background_data(),
    )))));
    let layer = meta_graph.add_node(Node::with_config(
        Box::new(Layer::new(Box::new(
            |_path: &str| -> Result<Buffer, library::GraphError> {
                Ok(Buffer::new(asset_data()))
            },
        ))),
        Config::new()
            .with("src", "asset.png")
            .with("opacity", 0.5)
            .with("x", 1.0),
    ));
    meta_graph
        .connect(PadId::new(bg, "output"), PadId::new(layer, "input"))
        .unwrap();

    let mut visitor = EvalVisitor::new();
    let meta_out = visitor
        .evaluate(&mut meta_graph, &PadId::new(layer, "output"))
        .unwrap();

    // Equivalent primitives wired by hand.
    let mut flat_graph = ConnectionGraph::new();
    let bg = flat_graph.add_node(Node::new(Box::new(BufferSource::new(Buffer::new(
        background_data(),
    )))));
    let content = flat_graph.add_node(Node::new(Box::new(BufferSource::new(Buffer::new(
        asset_data(),
    )))));
    let opacity = flat_graph.add_node(Node::with_config(
        Box::new(Opacity::default()),
        Config::new().with("value", 0.5),
    ));
    let shift = flat_graph.add_node(Node::with_config(
        Box::new(Shift::default()),
        Config::new().with("x", 1.0),
    ));
    let over = flat_graph.add_node(Node::new(Box::new(Over)));
    flat_graph
        .connect(PadId::new(content, "output"), PadId::new(opacity, "input"))
        .unwrap();
    flat_graph
        .connect(PadId::new(opacity, "output"), PadId::new(shift, "input"))
        .unwrap();
    flat_graph
        .connect(PadId::new(shift, "output"), PadId::new(over, "aux"))
        .unwrap();
    flat_graph
        .connect(PadId::new(bg, "output"), PadId::new(over, "input"))
        .unwrap();

    let flat_out = visitor
        .evaluate(&mut flat_graph, &PadId::new(over, "output"))
        .unwrap();

    assert_eq!(pixels(&meta_out), pixels(&flat_out));
    meta_out.release();
    flat_out.release();
}

#[test]
fn layer_pulls_aux_when_src_is_empty() {
    init_logs();
    let mut graph = ConnectionGraph::new();

    let bg = graph.add_node(Node::new(Box::new(BufferSource::new(Buffer::new(
        background_data(),
    )))));
    let content = graph.add_node(Node::new(Box::new(BufferSource::new(Buffer::new(
        asset_data(),
    )))));
    let layer = graph.add_node(Node::with_config(
        Box::new(Layer::new(Box::new(
            |path: &str| -> Result<Buffer, library::GraphError> {
                Err(library::GraphError::InvalidArgument(format!(
                    "no loads expected, got {path}"
                )))
            },
        ))),
        Config::new().with("opacity", 1.0),
    ));
    graph
        .connect(PadId::new(bg, "output"), PadId::new(layer, "input"))
        .unwrap();
    graph
        .connect(PadId::new(content, "output"), PadId::new(layer, "aux"))
        .unwrap();

    let mut visitor = EvalVisitor::new();
    let target = PadId::new(layer, "output");
    let first = visitor.evaluate(&mut graph, &target).unwrap();

    // With opacity 1 and no shift, the aux content composites unchanged
    // over the background.
    let expected = {
        let asset = asset_data();
        let background = background_data();
        let mut out = background.pixels.clone();
        for i in 0..4 {
            let alpha = asset.pixels[4 * i + 3];
            for c in 0..4 {
                out[4 * i + c] = asset.pixels[4 * i + c] + out[4 * i + c] * (1.0 - alpha);
            }
        }
        out
    };
    assert_eq!(pixels(&first), expected);

    // Unchanged config: repeated prepare leaves the rewiring as-is.
    let second = visitor.evaluate(&mut graph, &target).unwrap();
    assert_eq!(pixels(&second), expected);
    first.release();
    second.release();
}

#[test]
fn layer_cache_reloads_only_on_key_change() {
    init_logs();

    let loads: Arc<Mutex<Vec<Buffer>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = loads.clone();
    let loader = move |_path: &str| -> Result<Buffer, library::GraphError> {
        let buffer = Buffer::new(asset_data());
        recorder.lock().unwrap().push(buffer.clone());
        Ok(buffer)
    };

    let mut graph = ConnectionGraph::new();
    let layer = graph.add_node(Node::with_config(
        Box::new(Layer::new(Box::new(loader))),
        Config::new().with("src", "a.png"),
    ));
    let target = PadId::new(layer, "output");
    let mut visitor = EvalVisitor::new();

    visitor.evaluate(&mut graph, &target).unwrap().release();
    visitor.evaluate(&mut graph, &target).unwrap().release();
    assert_eq!(loads.lock().unwrap().len(), 1, "same key must not reload");

    graph.node_mut(layer).unwrap().config.set("src", "b.png");
    visitor.evaluate(&mut graph, &target).unwrap().release();
    {
        let loads = loads.lock().unwrap();
        assert_eq!(loads.len(), 2, "key change reloads exactly once");
        assert!(loads[0].is_freed(), "stale cached asset is released");
        assert!(!loads[1].is_freed());
    }

    visitor.evaluate(&mut graph, &target).unwrap().release();
    assert_eq!(loads.lock().unwrap().len(), 2);
}
