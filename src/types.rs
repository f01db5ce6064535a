//! Core identifier types for cinder-dom.
//!
//! These types define the foundation that everything builds on.
//! They flow through the diff pipeline and cross the interop boundary,
//! so they all serialize as plain integers.

use serde::{Deserialize, Serialize};

/// Author-assigned sequence number on every frame.
///
/// A sequence number is a stability hint for the diff engine, not a position:
/// authoring code assigns them in source order, so a lower sequence appearing
/// after a higher one tells the diff that a different conditional branch
/// produced the output.
pub type Sequence = u32;

/// Identity of an attached component, assigned by the [`Renderer`] at attach
/// time and stable for the component's lifetime.
///
/// [`Renderer`]: crate::renderer::Renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub u32);

/// Identity of one render batch, strictly increasing per renderer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub u64);

/// Identity of an element-reference capture, assigned by the builder and
/// resolved by the display side once the real node exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureId(pub u64);

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "batch {}", self.0)
    }
}
