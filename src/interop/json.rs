//! JSON codec for the interop message types.
//!
//! One message per line of text is the framing transports are expected to
//! use; the codec itself only turns messages into compact JSON and back.

use super::channel::{InboundMessage, OutboundMessage};

pub fn encode_outbound(message: &OutboundMessage) -> serde_json::Result<String> {
    serde_json::to_string(message)
}

pub fn decode_inbound(text: &str) -> serde_json::Result<InboundMessage> {
    serde_json::from_str(text)
}
