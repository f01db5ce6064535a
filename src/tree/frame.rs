//! Frame definitions - the tagged records a render tree is made of.
//!
//! A render tree is stored flat: a depth-first preorder sequence of [`Frame`]
//! records where every container frame (element, component, region) carries a
//! subtree length instead of child pointers. Attribute frames sit immediately
//! after the container frame that owns them, in declaration order, before any
//! child content. Element-reference captures sit in the same attribute region.

use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::renderer::{Component, EventArgs};
use crate::types::{CaptureId, ComponentId, Sequence};

// =============================================================================
// Frame
// =============================================================================

/// One record in a flattened render tree.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Author-assigned sequence number. A diff stability hint, not an index.
    pub sequence: Sequence,
    pub content: FrameContent,
}

/// Kind-specific payload of a [`Frame`].
#[derive(Debug, Clone)]
pub enum FrameContent {
    /// A DOM element. `subtree_len` counts all descendant frames.
    Element { tag: String, subtree_len: u32 },

    /// Plain text content.
    Text { text: String, flags: TextFlags },

    /// An attribute on the preceding element or component frame.
    Attribute { name: String, value: AttributeValue },

    /// A child component slot. `id` is bound by the renderer at attach time
    /// and is `None` only between building and the diff's side-effect pass.
    Component {
        ty: ComponentType,
        subtree_len: u32,
        id: Option<ComponentId>,
    },

    /// Transparent grouping marker: lets nested template logic contribute
    /// zero or more frames without being mistaken for one node by the diff.
    /// Never produces rendered output of its own.
    Region { subtree_len: u32 },

    /// Requests that the display side report the realized element node back
    /// under `capture`. Lives in the owning element's attribute region.
    ElementReferenceCapture { capture: CaptureId },
}

/// Discriminant of a frame, compared first by the diff engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Element,
    Text,
    Attribute,
    Component,
    Region,
    ElementReferenceCapture,
}

bitflags! {
    /// Flags on text frames.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TextFlags: u8 {
        /// Content is entirely whitespace. Semantically still plain text;
        /// the display side may coalesce such nodes.
        const WHITESPACE_ONLY = 1;
    }
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self.content {
            FrameContent::Element { .. } => FrameKind::Element,
            FrameContent::Text { .. } => FrameKind::Text,
            FrameContent::Attribute { .. } => FrameKind::Attribute,
            FrameContent::Component { .. } => FrameKind::Component,
            FrameContent::Region { .. } => FrameKind::Region,
            FrameContent::ElementReferenceCapture { .. } => FrameKind::ElementReferenceCapture,
        }
    }

    /// Descendant count for container frames, 0 for leaves.
    pub fn subtree_len(&self) -> u32 {
        match self.content {
            FrameContent::Element { subtree_len, .. }
            | FrameContent::Component { subtree_len, .. }
            | FrameContent::Region { subtree_len } => subtree_len,
            _ => 0,
        }
    }

    /// Total frames this frame accounts for in the flat array (self included).
    pub fn span(&self) -> usize {
        1 + self.subtree_len() as usize
    }

    pub fn is_attribute_region(&self) -> bool {
        matches!(
            self.kind(),
            FrameKind::Attribute | FrameKind::ElementReferenceCapture
        )
    }
}

// =============================================================================
// Attribute values
// =============================================================================

/// Value of an attribute frame.
///
/// Only text, boolean and event-handler values affect the DOM; an object bag
/// is carried for component parameters and interop payloads but never
/// rendered.
#[derive(Debug, Clone)]
pub enum AttributeValue {
    Text(String),
    Bool(bool),
    Handler(EventHandler),
    Object(serde_json::Value),
}

impl AttributeValue {
    /// Whether this value kind reaches the DOM at all.
    pub fn affects_dom(&self) -> bool {
        !matches!(self, AttributeValue::Object(_))
    }

    /// Equality as the diff engine sees it.
    ///
    /// Handlers are closures and get a fresh allocation every render, so
    /// handler-to-handler is always "same": dispatch resolves through the
    /// live frame array, never through a serialized handler.
    pub fn same_rendered_value(&self, other: &AttributeValue) -> bool {
        match (self, other) {
            (AttributeValue::Text(a), AttributeValue::Text(b)) => a == b,
            (AttributeValue::Bool(a), AttributeValue::Bool(b)) => a == b,
            (AttributeValue::Handler(_), AttributeValue::Handler(_)) => true,
            (AttributeValue::Object(a), AttributeValue::Object(b)) => a == b,
            _ => false,
        }
    }

    /// Equality for component parameter change detection: handlers always
    /// count as changed, everything else compares by value.
    pub fn same_parameter_value(&self, other: &AttributeValue) -> bool {
        match (self, other) {
            (AttributeValue::Handler(_), AttributeValue::Handler(_)) => false,
            _ => self.same_rendered_value(other),
        }
    }
}

/// An event-handler delegate stored inside an attribute frame.
///
/// The handler never crosses the interop boundary: the wire carries only an
/// opaque (component id, attribute sequence) reference, resolved back through
/// the renderer on dispatch.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&EventArgs)>);

impl EventHandler {
    pub fn new(f: impl Fn(&EventArgs) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn invoke(&self, args: &EventArgs) {
        (self.0)(args)
    }

    /// Identity comparison. Two handlers built from identical closures are
    /// still distinct.
    pub fn ptr_eq(&self, other: &EventHandler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventHandler(..)")
    }
}

// =============================================================================
// Component types
// =============================================================================

/// Runtime identity and factory for a component type.
///
/// Component frames carry one of these so the renderer can instantiate newly
/// discovered children and can tell "same component, new parameters" apart
/// from "different component type entirely".
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    create: fn() -> Box<dyn Component>,
}

impl ComponentType {
    pub fn of<T: Component + Default + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            create: || Box::new(T::default()),
        }
    }

    pub fn instantiate(&self) -> Box<dyn Component> {
        (self.create)()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderResult;
    use crate::tree::builder::RenderTreeBuilder;

    #[derive(Default)]
    struct A;
    #[derive(Default)]
    struct B;

    impl Component for A {
        fn build_render_tree(&mut self, _tree: &mut RenderTreeBuilder) -> RenderResult<()> {
            Ok(())
        }
    }
    impl Component for B {
        fn build_render_tree(&mut self, _tree: &mut RenderTreeBuilder) -> RenderResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_component_type_identity() {
        assert_eq!(ComponentType::of::<A>(), ComponentType::of::<A>());
        assert_ne!(ComponentType::of::<A>(), ComponentType::of::<B>());
    }

    #[test]
    fn test_handler_identity() {
        let a = EventHandler::new(|_| {});
        let b = a.clone();
        let c = EventHandler::new(|_| {});
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn test_rendered_value_equality() {
        let text = AttributeValue::Text("on".into());
        let boolean = AttributeValue::Bool(true);
        assert!(text.same_rendered_value(&AttributeValue::Text("on".into())));
        assert!(!text.same_rendered_value(&boolean));

        // Fresh closures every render must not dirty the DOM.
        let h1 = AttributeValue::Handler(EventHandler::new(|_| {}));
        let h2 = AttributeValue::Handler(EventHandler::new(|_| {}));
        assert!(h1.same_rendered_value(&h2));
        // ...but as component parameters they always count as changed.
        assert!(!h1.same_parameter_value(&h2));
    }

    #[test]
    fn test_span() {
        let el = Frame {
            sequence: 0,
            content: FrameContent::Element {
                tag: "div".into(),
                subtree_len: 3,
            },
        };
        assert_eq!(el.span(), 4);
        assert_eq!(el.kind(), FrameKind::Element);

        let text = Frame {
            sequence: 1,
            content: FrameContent::Text {
                text: "hi".into(),
                flags: TextFlags::empty(),
            },
        };
        assert_eq!(text.span(), 1);
    }
}
