//! # cinder-dom
//!
//! Render-tree reconciliation engine for component UIs.
//!
//! Components describe their output as flat arrays of frames rather than
//! node trees: containment is encoded in subtree lengths, and every frame
//! carries a sequence number marking which call site in the component's
//! build logic produced it. Diffing two outputs of the same component uses
//! those sequence numbers to recognize branches that appeared or vanished,
//! yielding minimal edit scripts without a general tree-diff search.
//!
//! The rendering pipeline:
//! ```text
//! Component → RenderTreeBuilder → FrameArray → diff → RenderBatch → DisplaySink
//! ```
//!
//! ## Modules
//!
//! - [`tree`] - Frame model, immutable frame arrays, the render tree builder
//! - [`diff`] - Edit scripts and the reconciliation engine
//! - [`renderer`] - Component lifetime, render passes, batch assembly, events
//! - [`interop`] - Wire format and the async channel to the display side
//! - [`types`] - Id newtypes shared across the crate
//! - [`error`] - The crate-wide error type

pub mod diff;
pub mod error;
pub mod interop;
pub mod renderer;
pub mod tree;
pub mod types;

// Re-export commonly used items
pub use types::{BatchId, CaptureId, ComponentId, Sequence};

pub use error::{RenderError, RenderResult};

pub use tree::{
    AttributeValue, ComponentType, EventHandler, Frame, FrameArray, FrameContent, FrameKind,
    RenderTreeBuilder, TextFlags,
};

pub use diff::{diff, DiffEffect, DiffResult, Edit};

pub use renderer::{
    Component, ComponentContext, ComponentEdits, DisplaySink, EventArgs, ParameterView,
    RenderBatch, Renderer, TriggerHandle,
};

pub use interop::{InboundMessage, InteropChannel, InteropError, OutboundMessage, WireBatch};
