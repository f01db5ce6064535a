//! Event argument DTOs delivered to handlers on dispatch.
//!
//! These arrive from the display side as JSON and deserialize into a typed
//! family: a base descriptor shared by every event plus kind-specific
//! payloads for the events the engine cares about. Anything the display side
//! sends that has no dedicated variant still dispatches as `Generic`.

use serde::{Deserialize, Serialize};

/// Fields every UI event carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDescriptor {
    /// Event type string, e.g. `"click"`.
    #[serde(rename = "type")]
    pub event_type: String,
    pub bubbles: bool,
    pub cancelable: bool,
    /// Whether the event propagates across shadow DOM boundaries.
    pub composed: bool,
}

/// Arguments of one dispatched UI event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventArgs {
    Generic(EventDescriptor),
    Change(ChangeEventArgs),
    Keyboard(KeyboardEventArgs),
    Mouse(MouseEventArgs),
    Pointer(PointerEventArgs),
}

impl EventArgs {
    pub fn descriptor(&self) -> &EventDescriptor {
        match self {
            EventArgs::Generic(d) => d,
            EventArgs::Change(a) => &a.descriptor,
            EventArgs::Keyboard(a) => &a.descriptor,
            EventArgs::Mouse(a) => &a.descriptor,
            EventArgs::Pointer(a) => &a.mouse.descriptor,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.descriptor().event_type
    }
}

impl Default for EventArgs {
    fn default() -> Self {
        EventArgs::Generic(EventDescriptor::default())
    }
}

/// Input change: `value` is a string or a bool depending on the input kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangeEventArgs {
    #[serde(flatten)]
    pub descriptor: EventDescriptor,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyboardEventArgs {
    #[serde(flatten)]
    pub descriptor: EventDescriptor,
    /// Value of the pressed key.
    pub key: String,
    /// Physical key code, independent of layout and modifier state.
    pub code: String,
    pub location: i64,
    pub ctrl_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
    pub meta_key: bool,
    pub repeat: bool,
    pub is_composing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MouseEventArgs {
    #[serde(flatten)]
    pub descriptor: EventDescriptor,
    pub screen_x: i64,
    pub screen_y: i64,
    pub client_x: i64,
    pub client_y: i64,
    pub ctrl_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
    pub meta_key: bool,
    pub button: i16,
    pub buttons: i16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PointerEventArgs {
    #[serde(flatten)]
    pub mouse: MouseEventArgs,
    pub pointer_id: i64,
    pub width: f64,
    pub height: f64,
    pub pressure: f32,
    pub tilt_x: i64,
    pub tilt_y: i64,
    /// `"mouse"`, `"pen"` or `"touch"`.
    pub pointer_type: String,
    pub is_primary: bool,
}
