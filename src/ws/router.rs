//! Inbound frame dispatch.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::ws::registry::SubscriptionRegistry;
use crate::ws::{Frame, MessageOut, StreamEvent};

/// Routes classified frames to registered callbacks.
///
/// The router never touches the socket itself; when a frame demands a reply
/// (`ping` → `pong`) it returns the outbound message and the receive loop
/// performs the send.
pub struct MessageRouter {
    registry: Arc<SubscriptionRegistry>,
}

impl MessageRouter {
    pub fn new(registry: Arc<SubscriptionRegistry>) -> Self {
        Self { registry }
    }

    /// Handle one raw text frame. Malformed frames are logged and dropped;
    /// they never take the connection down.
    pub async fn dispatch(&self, text: &str) -> Option<MessageOut> {
        let frame = match Frame::parse(text) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(%err, "dropping malformed frame");
                return None;
            }
        };

        match frame {
            Frame::Ping => Some(MessageOut::Pong),
            Frame::Pong => None,
            Frame::Connected => {
                // Handshake frames arriving mid-stream carry no payload we
                // track; the connect path consumes the real one.
                debug!("ignoring connected frame outside handshake");
                None
            }
            Frame::Subscribed { channel, payload } => {
                self.deliver(StreamEvent::Subscribed, &channel, &payload)
                    .await;
                None
            }
            Frame::Update { channel, payload } => {
                self.deliver(StreamEvent::Update, &channel, &payload).await;
                None
            }
            Frame::Unknown { kind } => {
                debug!(%kind, "ignoring unknown frame type");
                None
            }
        }
    }

    /// Invoke every callback for the channel in registration order. A
    /// callback error is logged and delivery continues with the next one.
    async fn deliver(
        &self,
        event: StreamEvent,
        channel: &crate::ws::Channel,
        payload: &serde_json::Value,
    ) {
        let callbacks = self.registry.callbacks(channel).await;
        if callbacks.is_empty() {
            debug!(%channel, event = event.as_str(), "frame for channel with no subscribers");
            return;
        }
        for callback in &callbacks {
            if let Err(err) = callback(event, payload) {
                warn!(%channel, event = event.as_str(), %err, "subscriber callback failed");
            }
        }
    }
}
