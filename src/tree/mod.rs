//! Render tree representation.
//!
//! The tree is a flat arena, not a pointer graph:
//!
//! ```text
//! component render → RenderTreeBuilder → FrameArray (immutable snapshot)
//! ```
//!
//! - [`frame`] - tagged frame records, attribute values, component types
//! - [`arena`] - the flat frame array and its structural invariant
//! - [`builder`] - the append-only authoring API with well-formedness checks

pub mod arena;
pub mod builder;
pub mod frame;

pub use arena::{ChildIndices, FrameArray};
pub use builder::RenderTreeBuilder;
pub use frame::{AttributeValue, ComponentType, EventHandler, Frame, FrameContent, FrameKind, TextFlags};
