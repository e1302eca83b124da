//! Message sender trait definition
//!
//! Defines the interface that all broker adapters must implement.

use async_trait::async_trait;
use relayq_types::{Message, Result};

/// Sender bound to a single broker queue
///
/// Implementations are created once at startup and shared across requests,
/// so `send` takes `&self` and must be safe to call concurrently.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Enqueue one message. Performs exactly one broker round-trip and never retries.
    async fn send(&self, message: &Message) -> Result<()>;

    /// Name of the queue this sender is bound to
    fn queue_name(&self) -> &str;
}
