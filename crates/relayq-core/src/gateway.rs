//! Gateway - Send orchestrator
//!
//! The Gateway owns the shared sender and turns requests into enqueued messages.

use std::sync::Arc;

use relayq_broker::MessageSender;
use relayq_types::{Message, Result, SendRequest};
use tracing::{debug, info, warn};

use crate::builder::build;

/// Build-then-enqueue front for a single queue
pub struct Gateway {
    /// Sender shared by all requests
    sender: Arc<dyn MessageSender>,
}

impl Gateway {
    /// Create a new gateway with an Arc sender
    pub fn with_sender(sender: Arc<dyn MessageSender>) -> Self {
        info!(queue = %sender.queue_name(), "Initializing RelayQ gateway");
        Self { sender }
    }

    /// Name of the queue messages are sent to
    pub fn queue_name(&self) -> &str {
        self.sender.queue_name()
    }

    /// Build the message for `request` and enqueue it.
    ///
    /// Returns the message that the broker accepted. Broker failures are
    /// returned unchanged and are not retried.
    pub async fn send(&self, request: &SendRequest) -> Result<Message> {
        let message = build(request);

        debug!(
            queue = %self.queue_name(),
            body_len = message.body().len(),
            session_id = ?message.session_id(),
            scheduled = ?message.scheduled_enqueue_time(),
            "Built message"
        );

        if let Err(e) = self.sender.send(&message).await {
            warn!(queue = %self.queue_name(), error = %e, "Failed to enqueue message");
            return Err(e);
        }

        info!(
            queue = %self.queue_name(),
            session = message.session_id().is_some(),
            scheduled = message.is_scheduled(),
            "Message enqueued"
        );

        Ok(message)
    }
}
