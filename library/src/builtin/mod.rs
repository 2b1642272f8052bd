//! Builtin operations exercising the engine: sources, filters, compositing
//! and the layer meta-operation.

pub mod composite;
pub mod filters;
pub mod layer;
pub mod source;

pub use composite::Over;
pub use filters::{Blur, Brighten, Opacity, Shift};
pub use layer::{AssetLoader, Layer};
pub use source::{BufferSource, SourceSlot};
