//! Instrumentation — passive per-operation-type timing observer.

use std::collections::HashMap;
use std::time::Duration;

/// Sink the evaluation visitor reports compute timings to.
pub trait InstrumentSink {
    fn record(&mut self, op_type: &str, elapsed: Duration);
}

/// Default sink that discards everything.
#[derive(Default)]
pub struct NoopInstrument;

impl InstrumentSink for NoopInstrument {
    fn record(&mut self, _op_type: &str, _elapsed: Duration) {}
}

/// Accumulated timing for one operation type.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpTiming {
    pub calls: u64,
    pub total: Duration,
}

/// Sink aggregating call counts and total elapsed time per operation type.
#[derive(Default)]
pub struct TimingInstrument {
    totals: HashMap<String, OpTiming>,
}

impl TimingInstrument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timing(&self, op_type: &str) -> Option<OpTiming> {
        self.totals.get(op_type).copied()
    }

    pub fn timings(&self) -> impl Iterator<Item = (&str, OpTiming)> {
        self.totals.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// One line per operation type, slowest first.
    pub fn report(&self) -> String {
        let mut entries: Vec<_> = self.totals.iter().collect();
        entries.sort_by(|a, b| b.1.total.cmp(&a.1.total));
        entries
            .iter()
            .map(|(op, t)| {
                format!("{}: {} calls, {:.3} ms", op, t.calls, t.total.as_secs_f64() * 1e3)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl InstrumentSink for TimingInstrument {
    fn record(&mut self, op_type: &str, elapsed: Duration) {
        let entry = self.totals.entry(op_type.to_string()).or_default();
        entry.calls += 1;
        entry.total += elapsed;
    }
}
