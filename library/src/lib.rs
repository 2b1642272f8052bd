pub mod buffer;
pub mod builtin;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod operation;

pub use buffer::{Buffer, BufferData};
pub use error::GraphError;
pub use evaluation::EvalVisitor;
pub use model::{ConnectionGraph, Node, PadId};
pub use operation::{Config, Operation};
