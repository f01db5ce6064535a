//! Wire representation of render batches.
//!
//! Frame arrays reference live component instances and event handler
//! closures, neither of which can cross the process boundary. The wire
//! types flatten a batch into plain data: handlers become opaque event
//! references the display side dispatches back as (component id, sequence)
//! pairs, component frames carry only their bound id.

use serde::{Deserialize, Serialize};

use crate::renderer::{ComponentEdits, RenderBatch};
use crate::diff::Edit;
use crate::tree::{AttributeValue, Frame, FrameContent, TextFlags};
use crate::types::{BatchId, CaptureId, ComponentId, Sequence};

/// One render batch, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBatch {
    pub id: BatchId,
    pub updates: Vec<WireComponentEdits>,
    pub disposed: Vec<ComponentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireComponentEdits {
    pub component_id: ComponentId,
    pub edits: Vec<Edit>,
    pub frames: Vec<WireFrame>,
}

/// Flat frame as the display side sees it. `frame_index` fields in the
/// accompanying edits index into this list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WireFrame {
    Element { sequence: Sequence, tag: String, subtree_len: u32 },
    Text { sequence: Sequence, text: String, whitespace_only: bool },
    Attribute { sequence: Sequence, name: String, value: WireAttributeValue },
    Component { sequence: Sequence, subtree_len: u32, component_id: Option<ComponentId> },
    Region { sequence: Sequence, subtree_len: u32 },
    ElementReferenceCapture { sequence: Sequence, capture: CaptureId },
}

/// Attribute payload on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum WireAttributeValue {
    Text(String),
    Bool(bool),
    /// Handler placeholder. The display side wires the DOM event to a
    /// dispatch of the owning component's id plus the attribute frame's
    /// sequence number.
    EventRef,
    /// Structured data attached for the component layer; produces no DOM
    /// attribute.
    Json(serde_json::Value),
}

impl From<&AttributeValue> for WireAttributeValue {
    fn from(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Text(text) => WireAttributeValue::Text(text.clone()),
            AttributeValue::Bool(b) => WireAttributeValue::Bool(*b),
            AttributeValue::Handler(_) => WireAttributeValue::EventRef,
            AttributeValue::Object(json) => WireAttributeValue::Json(json.clone()),
        }
    }
}

impl From<&Frame> for WireFrame {
    fn from(frame: &Frame) -> Self {
        let sequence = frame.sequence;
        match &frame.content {
            FrameContent::Element { tag, subtree_len } => WireFrame::Element {
                sequence,
                tag: tag.clone(),
                subtree_len: *subtree_len,
            },
            FrameContent::Text { text, flags } => WireFrame::Text {
                sequence,
                text: text.clone(),
                whitespace_only: flags.contains(TextFlags::WHITESPACE_ONLY),
            },
            FrameContent::Attribute { name, value } => WireFrame::Attribute {
                sequence,
                name: name.clone(),
                value: value.into(),
            },
            FrameContent::Component { subtree_len, id, .. } => WireFrame::Component {
                sequence,
                subtree_len: *subtree_len,
                component_id: *id,
            },
            FrameContent::Region { subtree_len } => WireFrame::Region {
                sequence,
                subtree_len: *subtree_len,
            },
            FrameContent::ElementReferenceCapture { capture } => {
                WireFrame::ElementReferenceCapture { sequence, capture: *capture }
            }
        }
    }
}

impl From<&ComponentEdits> for WireComponentEdits {
    fn from(update: &ComponentEdits) -> Self {
        WireComponentEdits {
            component_id: update.component_id,
            edits: update.edits.clone(),
            frames: update.frames.frames().iter().map(WireFrame::from).collect(),
        }
    }
}

impl From<&RenderBatch> for WireBatch {
    fn from(batch: &RenderBatch) -> Self {
        WireBatch {
            id: batch.id,
            updates: batch.updates.iter().map(WireComponentEdits::from).collect(),
            disposed: batch.disposed.clone(),
        }
    }
}
