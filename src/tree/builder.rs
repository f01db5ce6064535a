//! Render tree builder - the stateful append API components render into.
//!
//! The builder appends frames to a flat buffer while tracking a stack of open
//! containers. Subtree lengths are patched retroactively when the matching
//! close call arrives, so authoring code never counts frames itself.
//!
//! # Well-formedness rules
//!
//! - Attributes (and element-reference captures) may only be added directly
//!   after an open element/component, before any child content.
//! - Every open must be closed by the matching close call, in order.
//! - `finish` fails if any container is still open.
//!
//! All violations surface as `RenderError::TreeStructure`. The builder is
//! reusable across render cycles: `finish` hands out an immutable snapshot
//! and starts the next cycle with the previous capacity as a hint.

use tracing::trace;

use crate::error::{RenderError, RenderResult};
use crate::tree::arena::FrameArray;
use crate::tree::frame::{AttributeValue, ComponentType, Frame, FrameContent, FrameKind, TextFlags};
use crate::renderer::Component;
use crate::types::{CaptureId, Sequence};

/// Stateful frame-appending API. One instance per renderer, reused for every
/// component render.
#[derive(Debug, Default)]
pub struct RenderTreeBuilder {
    frames: Vec<Frame>,
    open_stack: Vec<usize>,
    accepting_attributes: bool,
    next_capture: u64,
    capacity_hint: usize,
}

impl RenderTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Containers
    // =========================================================================

    /// Open an element frame. Must be balanced by [`close_element`].
    ///
    /// [`close_element`]: RenderTreeBuilder::close_element
    pub fn open_element(&mut self, sequence: Sequence, tag: &str) {
        self.open(
            sequence,
            FrameContent::Element {
                tag: tag.into(),
                subtree_len: 0,
            },
        );
    }

    pub fn close_element(&mut self) -> RenderResult<()> {
        self.close(FrameKind::Element)
    }

    /// Open a child component slot for component type `T`.
    pub fn open_component<T: Component + Default + 'static>(&mut self, sequence: Sequence) {
        self.open_component_type(sequence, ComponentType::of::<T>());
    }

    /// Open a child component slot for an already-resolved component type.
    pub fn open_component_type(&mut self, sequence: Sequence, ty: ComponentType) {
        self.open(
            sequence,
            FrameContent::Component {
                ty,
                subtree_len: 0,
                id: None,
            },
        );
    }

    pub fn close_component(&mut self) -> RenderResult<()> {
        self.close(FrameKind::Component)
    }

    /// Open a transparent region. Regions let nested template logic emit zero
    /// or more frames without the parent's diff mistaking them for one node.
    pub fn open_region(&mut self, sequence: Sequence) {
        self.open(sequence, FrameContent::Region { subtree_len: 0 });
    }

    pub fn close_region(&mut self) -> RenderResult<()> {
        self.close(FrameKind::Region)
    }

    // =========================================================================
    // Leaves
    // =========================================================================

    /// Append a text frame. Whitespace-only content is flagged so the display
    /// side can coalesce it.
    pub fn add_content(&mut self, sequence: Sequence, text: &str) {
        let flags = if !text.is_empty() && text.chars().all(char::is_whitespace) {
            TextFlags::WHITESPACE_ONLY
        } else {
            TextFlags::empty()
        };
        self.append(Frame {
            sequence,
            content: FrameContent::Text {
                text: text.into(),
                flags,
            },
        });
        self.accepting_attributes = false;
    }

    /// Append an attribute on the most recently opened element or component.
    ///
    /// Fails once any child content has been added under the open container.
    pub fn add_attribute(
        &mut self,
        sequence: Sequence,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> RenderResult<()> {
        self.owner_for_attribute(name)?;
        self.append(Frame {
            sequence,
            content: FrameContent::Attribute {
                name: name.into(),
                value: value.into(),
            },
        });
        Ok(())
    }

    /// Append an element-reference capture in the attribute region of the
    /// currently open element. Returns the capture id the display side will
    /// answer with.
    pub fn add_element_reference_capture(
        &mut self,
        sequence: Sequence,
    ) -> RenderResult<CaptureId> {
        let owner = self.owner_for_attribute("element reference capture")?;
        if self.frames[owner].kind() != FrameKind::Element {
            return Err(RenderError::TreeStructure(
                "element reference capture requires an open element".into(),
            ));
        }
        let capture = CaptureId(self.next_capture);
        self.next_capture += 1;
        self.append(Frame {
            sequence,
            content: FrameContent::ElementReferenceCapture { capture },
        });
        Ok(capture)
    }

    // =========================================================================
    // Finalize
    // =========================================================================

    /// Seal the current cycle into an immutable snapshot and reset for the
    /// next one. Fails if any container is still open.
    pub fn finish(&mut self) -> RenderResult<FrameArray> {
        if let Some(&open) = self.open_stack.last() {
            let unterminated = self.frames[open].kind();
            self.reset();
            return Err(RenderError::TreeStructure(format!(
                "unterminated {unterminated:?} frame at finalize"
            )));
        }
        self.capacity_hint = self.frames.len();
        self.accepting_attributes = false;
        let frames = std::mem::replace(&mut self.frames, Vec::with_capacity(self.capacity_hint));
        trace!(frames = frames.len(), "render tree sealed");
        Ok(FrameArray::from_frames(frames))
    }

    /// Drop any partial output, e.g. after a failed component render.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.open_stack.clear();
        self.accepting_attributes = false;
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn open(&mut self, sequence: Sequence, content: FrameContent) {
        let index = self.frames.len();
        self.append(Frame { sequence, content });
        self.open_stack.push(index);
        self.accepting_attributes = true;
    }

    fn close(&mut self, expected: FrameKind) -> RenderResult<()> {
        let Some(open) = self.open_stack.pop() else {
            return Err(RenderError::TreeStructure(format!(
                "close of {expected:?} with no open frame"
            )));
        };
        let actual = self.frames[open].kind();
        if actual != expected {
            return Err(RenderError::TreeStructure(format!(
                "close of {expected:?} does not match open {actual:?}"
            )));
        }
        let descendants = (self.frames.len() - open - 1) as u32;
        match &mut self.frames[open].content {
            FrameContent::Element { subtree_len, .. }
            | FrameContent::Component { subtree_len, .. }
            | FrameContent::Region { subtree_len } => *subtree_len = descendants,
            _ => unreachable!("open stack only holds containers"),
        }
        self.accepting_attributes = false;
        Ok(())
    }

    /// Index of the open container that may still accept attributes.
    fn owner_for_attribute(&self, what: &str) -> RenderResult<usize> {
        let owner = self
            .open_stack
            .last()
            .copied()
            .filter(|_| self.accepting_attributes);
        match owner {
            Some(index) if self.frames[index].kind() != FrameKind::Region => Ok(index),
            Some(_) => Err(RenderError::TreeStructure(format!(
                "{what} not valid on a region frame"
            ))),
            None => Err(RenderError::TreeStructure(format!(
                "{what} must directly follow an open element or component"
            ))),
        }
    }

    fn append(&mut self, frame: Frame) {
        self.frames.push(frame);
    }
}

// Ergonomic attribute value conversions for authoring code.
impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.into())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<crate::tree::frame::EventHandler> for AttributeValue {
    fn from(h: crate::tree::frame::EventHandler) -> Self {
        AttributeValue::Handler(h)
    }
}

impl From<serde_json::Value> for AttributeValue {
    fn from(v: serde_json::Value) -> Self {
        AttributeValue::Object(v)
    }
}
