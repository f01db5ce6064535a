//! Async message channel between the renderer and the display side.
//!
//! Outbound traffic is a single mpsc stream: render batches to apply and
//! method invocations awaiting a result. Inbound traffic is fed back to
//! [`InteropChannel::handle_inbound`] by whatever transport loop owns the
//! connection: batch acknowledgements, UI events to dispatch, and
//! invocation results matched to their pending calls by call id.
//!
//! The renderer itself is single-owner and not `Send`; everything here is
//! built for a current-thread runtime, which is why pending calls live in
//! an `Rc<RefCell<..>>` rather than behind a lock.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::error::RenderResult;
use crate::renderer::{DisplaySink, EventArgs, RenderBatch, Renderer};
use crate::types::{BatchId, ComponentId, Sequence};

use super::wire::WireBatch;

/// Renderer-to-display messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OutboundMessage {
    /// Apply a render batch and acknowledge with [`InboundMessage::BatchApplied`].
    ApplyBatch { batch: WireBatch },
    /// Invoke a display-side method; answered by
    /// [`InboundMessage::InvocationResult`] with the same call id.
    Invoke {
        call_id: u64,
        method: String,
        args: serde_json::Value,
    },
}

/// Display-to-renderer messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InboundMessage {
    BatchApplied { batch_id: BatchId },
    /// A UI event fired on a handler attribute: dispatched by owning
    /// component id and the attribute frame's sequence number.
    Event {
        component_id: ComponentId,
        sequence: Sequence,
        args: EventArgs,
    },
    InvocationResult {
        call_id: u64,
        result: Result<serde_json::Value, String>,
    },
}

#[derive(Debug, Error)]
pub enum InteropError {
    /// The display side went away before answering.
    #[error("interop channel closed")]
    ChannelClosed,
    /// The display side ran the method and it failed there.
    #[error("display-side invocation failed: {0}")]
    Invocation(String),
}

type PendingCalls = Rc<RefCell<HashMap<u64, oneshot::Sender<Result<serde_json::Value, String>>>>>;

/// Renderer-side endpoint of the interop connection.
pub struct InteropChannel {
    outbound: mpsc::UnboundedSender<OutboundMessage>,
    next_call_id: Cell<u64>,
    pending: PendingCalls,
    last_applied: Cell<Option<BatchId>>,
}

impl InteropChannel {
    /// Creates the channel, returning the receiving end of the outbound
    /// stream for the transport loop to drain.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let channel = Self {
            outbound,
            next_call_id: Cell::new(0),
            pending: Rc::new(RefCell::new(HashMap::new())),
            last_applied: Cell::new(None),
        };
        (channel, rx)
    }

    /// A [`DisplaySink`] that forwards completed batches onto the wire.
    pub fn display_sink(&self) -> ChannelSink {
        ChannelSink {
            outbound: self.outbound.clone(),
        }
    }

    /// Id of the newest batch the display side has acknowledged.
    pub fn last_applied(&self) -> Option<BatchId> {
        self.last_applied.get()
    }

    /// Calls a display-side method and awaits its result.
    pub async fn invoke(
        &self,
        method: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value, InteropError> {
        let call_id = self.next_call_id.get();
        self.next_call_id.set(call_id + 1);
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().insert(call_id, tx);
        let sent = self.outbound.send(OutboundMessage::Invoke {
            call_id,
            method: method.to_string(),
            args,
        });
        if sent.is_err() {
            self.pending.borrow_mut().remove(&call_id);
            return Err(InteropError::ChannelClosed);
        }
        tracing::debug!(call_id, method, "invocation sent");
        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(InteropError::Invocation(message)),
            Err(_) => Err(InteropError::ChannelClosed),
        }
    }

    /// Routes one inbound message. Event dispatch errors propagate to the
    /// caller; recoverable ones (unknown handler) can be reported to the
    /// display side and ignored.
    pub fn handle_inbound(
        &self,
        renderer: &mut Renderer,
        message: InboundMessage,
    ) -> RenderResult<()> {
        match message {
            InboundMessage::BatchApplied { batch_id } => {
                tracing::debug!(batch = %batch_id, "batch acknowledged");
                self.last_applied.set(Some(batch_id));
                Ok(())
            }
            InboundMessage::Event {
                component_id,
                sequence,
                args,
            } => renderer.dispatch_event(component_id, sequence, &args),
            InboundMessage::InvocationResult { call_id, result } => {
                match self.pending.borrow_mut().remove(&call_id) {
                    Some(tx) => {
                        // Receiver may have been dropped; nothing to do then.
                        let _ = tx.send(result);
                    }
                    None => tracing::warn!(call_id, "result for unknown invocation"),
                }
                Ok(())
            }
        }
    }
}

/// Outbound half handed to the [`Renderer`].
pub struct ChannelSink {
    outbound: mpsc::UnboundedSender<OutboundMessage>,
}

impl DisplaySink for ChannelSink {
    fn update_display(&mut self, batch: &RenderBatch) {
        let message = OutboundMessage::ApplyBatch {
            batch: WireBatch::from(batch),
        };
        if self.outbound.send(message).is_err() {
            tracing::warn!(batch = %batch.id, "display side gone, batch dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invocation_round_trip() {
        let (channel, mut rx) = InteropChannel::new();

        let pending = channel.invoke("focusElement", serde_json::json!({ "capture": 0 }));
        tokio::pin!(pending);

        // The invoke future is lazy; poll it once so the message sends.
        let message = tokio::select! {
            biased;
            _ = &mut pending => panic!("no result delivered yet"),
            m = rx.recv() => m.unwrap(),
        };
        let OutboundMessage::Invoke { call_id, method, .. } = message else {
            panic!("expected invoke message");
        };
        assert_eq!(method, "focusElement");

        // Correlation needs no renderer; feed the result straight back.
        let mut renderer = Renderer::new(NullSink);
        channel
            .handle_inbound(
                &mut renderer,
                InboundMessage::InvocationResult {
                    call_id,
                    result: Ok(serde_json::json!(true)),
                },
            )
            .unwrap();

        assert_eq!(pending.await.unwrap(), serde_json::json!(true));
    }

    #[tokio::test]
    async fn test_failed_invocation_surfaces_message() {
        let (channel, _rx) = InteropChannel::new();
        let pending = channel.invoke("scrollTo", serde_json::json!(null));
        tokio::pin!(pending);

        let mut renderer = Renderer::new(NullSink);
        tokio::select! {
            biased;
            _ = &mut pending => panic!("no result delivered yet"),
            _ = std::future::ready(()) => {}
        };
        channel
            .handle_inbound(
                &mut renderer,
                InboundMessage::InvocationResult {
                    call_id: 0,
                    result: Err("element not found".into()),
                },
            )
            .unwrap();

        match pending.await {
            Err(InteropError::Invocation(message)) => {
                assert_eq!(message, "element not found");
            }
            other => panic!("expected invocation error, got {other:?}"),
        }
    }

    #[test]
    fn test_batch_ack_updates_watermark() {
        let (channel, _rx) = InteropChannel::new();
        let mut renderer = Renderer::new(NullSink);
        assert_eq!(channel.last_applied(), None);
        channel
            .handle_inbound(
                &mut renderer,
                InboundMessage::BatchApplied {
                    batch_id: BatchId(2),
                },
            )
            .unwrap();
        assert_eq!(channel.last_applied(), Some(BatchId(2)));
    }

    struct NullSink;

    impl DisplaySink for NullSink {
        fn update_display(&mut self, _batch: &RenderBatch) {}
    }
}
