//! Evaluation — pull-based graph scheduling and instrumentation.

pub mod instrument;
pub mod visitor;

pub use instrument::{InstrumentSink, NoopInstrument, OpTiming, TimingInstrument};
pub use visitor::EvalVisitor;

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Lets a caller keep a handle on a sink it hands to the visitor.
impl<T: InstrumentSink> InstrumentSink for Arc<Mutex<T>> {
    fn record(&mut self, op_type: &str, elapsed: Duration) {
        self.lock().unwrap().record(op_type, elapsed);
    }
}
