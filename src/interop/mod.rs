//! Bridge between the renderer and a remote display.
//!
//! Three pieces:
//!
//!   wire     flat, serializable form of batches and frames
//!   channel  async mpsc plumbing, invocation correlation, event routing
//!   json     text codec used by line-oriented transports
//!
//! The transport itself (websocket, pipe, test harness) lives outside the
//! crate; it drains the outbound receiver and feeds inbound messages back
//! through [`InteropChannel::handle_inbound`].

pub mod channel;
pub mod json;
pub mod wire;

pub use channel::{ChannelSink, InboundMessage, InteropChannel, InteropError, OutboundMessage};
pub use wire::{WireAttributeValue, WireBatch, WireComponentEdits, WireFrame};
