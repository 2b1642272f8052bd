//! Evaluation visitor — the pull-based scheduler.
//!
//! One `evaluate` call is one pass: a memoized post-order depth-first walk
//! from the requested output pad. All connected inputs of a node are
//! resolved before its `compute` runs; each output pad computes at most
//! once per pass and each node pulls its inputs at most once per pass; a
//! producer's owning reference drops the moment its last consumer has taken
//! the buffer, while consumer references live until pass teardown.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use uuid::Uuid;

use super::instrument::{InstrumentSink, NoopInstrument};
use crate::buffer::Buffer;
use crate::error::GraphError;
use crate::model::graph::ConnectionGraph;
use crate::model::pad::PadId;
use crate::operation::InputBuffers;
use crate::operation::subgraph;

/// Per-pass evaluation state.
///
/// The visitor owns all transient buffers of a pass: the `resolved` map
/// holds one owning reference per computed output pad, dropped either when
/// the pad's last consumer has taken the buffer or at pass teardown.
pub struct EvalVisitor {
    /// Computed buffers for this pass; one owning reference each.
    resolved: HashMap<PadId, Buffer>,
    /// Pads currently being resolved, for re-entry detection.
    visiting: HashSet<PadId>,
    /// Consumers of each output pad that have not yet taken its buffer.
    remaining: HashMap<PadId, usize>,
    /// Pulled inputs per node, one consumer reference each. Gathered at
    /// most once per pass so a node with several output pads cannot drain
    /// an upstream pad's consumer count more than once per connection.
    node_inputs: HashMap<Uuid, InputBuffers>,
    /// Nodes whose `prepare` already ran this pass.
    prepared: HashSet<Uuid>,
    instrument: Box<dyn InstrumentSink>,
}

impl EvalVisitor {
    pub fn new() -> Self {
        Self::with_instrument(Box::new(NoopInstrument))
    }

    pub fn with_instrument(instrument: Box<dyn InstrumentSink>) -> Self {
        Self {
            resolved: HashMap::new(),
            visiting: HashSet::new(),
            remaining: HashMap::new(),
            node_inputs: HashMap::new(),
            prepared: HashSet::new(),
            instrument,
        }
    }

    /// Run one evaluation pass for `target`, returning its buffer.
    ///
    /// The returned buffer carries one owning reference that transfers to
    /// the caller. On error the pass is aborted; buffers already released
    /// stay released and the graph remains valid for a subsequent pass.
    pub fn evaluate(
        &mut self,
        graph: &mut ConnectionGraph,
        target: &PadId,
    ) -> Result<Buffer, GraphError> {
        self.teardown(false);
        let result = self.resolve(graph, target);
        if result.is_ok() {
            // Ownership of the target's reference transfers to the caller.
            self.resolved.remove(target);
        }
        self.teardown(true);
        result
    }

    /// Resolve one output pad: inputs first (post-order), then compute.
    fn resolve(
        &mut self,
        graph: &mut ConnectionGraph,
        target: &PadId,
    ) -> Result<Buffer, GraphError> {
        if let Some(buffer) = self.resolved.get(target) {
            return Ok(buffer.clone());
        }
        // Connect-time validation keeps graphs acyclic; this guards against
        // re-entry through a subgraph wired by a misbehaving `prepare`.
        if !self.visiting.insert(target.clone()) {
            return Err(GraphError::InvalidArgument(format!(
                "cycle detected while resolving {target}"
            )));
        }

        let node_id = target.node_id;
        if graph.node(node_id)?.output_pad(&target.pad_name).is_none() {
            self.visiting.remove(target);
            return Err(GraphError::PadNotFound(target.clone()));
        }

        // Lazy one-time subgraph expansion, then per-pass prepare. Prepare
        // may rewire the internal graph, so it runs before inputs are
        // pulled.
        graph.node_mut(node_id)?.ensure_associated()?;
        if self.prepared.insert(node_id) {
            graph.node_mut(node_id)?.run_prepare()?;
        }

        if !self.node_inputs.contains_key(&node_id) {
            let gathered = self.gather_inputs(graph, node_id)?;
            self.node_inputs.insert(node_id, gathered);
        }
        // Non-owning aliases of the memoized handles; the memo keeps the
        // references alive until teardown.
        let inputs = self.node_inputs.get(&node_id).cloned().unwrap_or_default();

        let computed = if graph.node(node_id)?.is_meta() {
            self.resolve_internal(graph, node_id, target, &inputs)
        } else {
            let node = graph.node_mut(node_id)?;
            let op_type = node.op_type();
            let start = Instant::now();
            let result = node.operation_mut().compute(&target.pad_name, &inputs);
            self.instrument.record(op_type, start.elapsed());
            result
        };

        let buffer = computed?;
        self.visiting.remove(target);
        self.resolved.insert(target.clone(), buffer.clone());
        Ok(buffer)
    }

    /// Pull every connected input of `node_id`, taking one consumer
    /// reference per buffer. Runs at most once per node per pass; on error
    /// the references taken so far are dropped again so an aborted pass
    /// cannot pin payloads.
    fn gather_inputs(
        &mut self,
        graph: &mut ConnectionGraph,
        node_id: Uuid,
    ) -> Result<InputBuffers, GraphError> {
        let input_names: Vec<String> = graph
            .node(node_id)?
            .input_pads()
            .iter()
            .map(|p| p.name.clone())
            .collect();

        let mut inputs = InputBuffers::new();
        for name in input_names {
            let to = PadId::new(node_id, &name);
            let Some(source) = graph.upstream(&to) else {
                continue;
            };
            let produced = match self.resolve(graph, &source) {
                Ok(buffer) => buffer,
                Err(err) => {
                    for buffer in inputs.values() {
                        buffer.release();
                    }
                    return Err(err);
                }
            };
            let handle = produced.acquire();
            if handle.is_empty() && !graph.node(source.node_id).map(subgraph::is_proxy)? {
                // Boundary proxies may legitimately carry no data yet;
                // anything else is a degraded-but-tolerated condition.
                log::warn!("missing buffer from {} feeding {}", source, to);
            }
            self.consume_source(graph, &source);
            inputs.insert(name, handle);
        }
        Ok(inputs)
    }

    /// Resolve a meta-node's boundary output through its internal graph.
    fn resolve_internal(
        &mut self,
        graph: &mut ConnectionGraph,
        node_id: Uuid,
        target: &PadId,
        inputs: &InputBuffers,
    ) -> Result<Buffer, GraphError> {
        let mut sub = graph.node_mut(node_id)?.take_internal().ok_or_else(|| {
            GraphError::InvalidArgument(format!("meta node {node_id} has no internal graph"))
        })?;

        // Seed the boundary input proxies with the outer resolved inputs;
        // each seeded pad takes its own reference. A second boundary output
        // of the same node re-seeds: the displaced reference must drop.
        for (pad_name, buffer) in inputs {
            if let Some(proxy) = sub.input_proxy(pad_name) {
                let pad = PadId::new(proxy, "output");
                if let Some(displaced) = self.resolved.insert(pad, buffer.acquire()) {
                    displaced.release();
                }
            }
        }

        let result = match sub.output_proxy(&target.pad_name) {
            Some(proxy) => self
                .resolve(sub.graph_mut(), &PadId::new(proxy, "output"))
                // The outer pad owns its own reference to the result.
                .map(|buffer| buffer.acquire()),
            None => Err(GraphError::PadNotFound(target.clone())),
        };

        graph.node_mut(node_id)?.put_internal(sub);
        result
    }

    /// Account one consumption of `source`; when its last consumer has
    /// taken the buffer, drop the pad's owning reference.
    fn consume_source(&mut self, graph: &ConnectionGraph, source: &PadId) {
        let remaining = self
            .remaining
            .entry(source.clone())
            .or_insert_with(|| graph.consumer_count(source));
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            if let Some(owned) = self.resolved.remove(source) {
                owned.release();
            }
        }
    }

    /// Release every buffer the pass still holds: fan-out consumers outside
    /// the evaluated subtree, aborted passes, seeded-but-unconsumed
    /// boundary proxies.
    fn teardown(&mut self, log_leftovers: bool) {
        for (pad, buffer) in self.resolved.drain() {
            if log_leftovers {
                log::debug!("releasing unconsumed buffer on {pad}");
            }
            buffer.release();
        }
        for (_, inputs) in self.node_inputs.drain() {
            for buffer in inputs.values() {
                buffer.release();
            }
        }
        self.visiting.clear();
        self.remaining.clear();
        self.prepared.clear();
    }
}

impl Default for EvalVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EvalVisitor {
    fn drop(&mut self) {
        // An abandoned pass must not keep buffers alive.
        self.teardown(false);
    }
}
