//! Error taxonomy for the reconciliation engine.
//!
//! Programmer errors (malformed trees, use-after-dispose) are fatal to the
//! render pass that raised them; the renderer isolates them at the
//! per-component boundary and routes them to its error sink. Stale event
//! references are the one recoverable case: they are reported to the caller
//! and nothing else happens.

use crate::types::{ComponentId, Sequence};
use thiserror::Error;

/// All errors the engine can surface.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Malformed open/close nesting or attribute placement in a builder call
    /// cycle. Programmer error, fatal to that render.
    #[error("malformed render tree: {0}")]
    TreeStructure(String),

    /// A disposed component id was referenced. Fatal, never recovered.
    #[error("component {0} is disposed")]
    ComponentDisposed(ComponentId),

    /// An event arrived for an attribute frame that no longer holds a handler.
    /// Recoverable: reported to the dispatching caller.
    #[error("no event handler on component {component} for sequence {sequence}")]
    EventHandlerNotFound {
        component: ComponentId,
        sequence: Sequence,
    },

    /// A frame array violated the subtree-length invariant. Indicates a
    /// builder bug; the diff asserts this rather than walking out of bounds.
    #[error("frame array inconsistency: {0}")]
    DiffInconsistency(String),

    /// A component's own render callback failed.
    #[error("component render failed: {0}")]
    Component(String),
}

/// Result alias used throughout the crate.
pub type RenderResult<T> = Result<T, RenderError>;

impl RenderError {
    /// Whether the renderer may keep running after surfacing this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RenderError::EventHandlerNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        let stale = RenderError::EventHandlerNotFound {
            component: ComponentId(3),
            sequence: 7,
        };
        assert!(stale.is_recoverable());
        assert!(!RenderError::ComponentDisposed(ComponentId(3)).is_recoverable());
        assert!(!RenderError::TreeStructure("x".into()).is_recoverable());
    }

    #[test]
    fn test_display_includes_ids() {
        let err = RenderError::ComponentDisposed(ComponentId(42));
        assert!(err.to_string().contains("#42"));
    }
}
