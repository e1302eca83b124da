//! In-memory sender
//!
//! Records messages in process instead of talking to a broker. Only the most
//! recent messages are retained; all data is lost when the process exits.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use relayq_types::{Message, Result};
use tracing::{debug, info};
use uuid::Uuid;

use crate::traits::MessageSender;

/// A message accepted by the in-memory sender
#[derive(Debug, Clone)]
pub struct EnqueuedMessage {
    /// Identifier assigned on enqueue
    pub id: Uuid,
    /// The message as submitted
    pub message: Message,
    /// When the message was accepted
    pub enqueued_at: DateTime<Utc>,
}

/// Number of messages retained when no capacity is given
pub const DEFAULT_CAPACITY: usize = 1000;

struct Retained {
    /// Most recent messages, oldest first
    messages: VecDeque<EnqueuedMessage>,
    /// Messages accepted over the sender's lifetime
    accepted: u64,
}

/// In-memory sender implementation
pub struct MemorySender {
    queue_name: String,
    capacity: usize,
    retained: Mutex<Retained>,
}

impl MemorySender {
    /// Create a new in-memory sender for the named queue
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self::with_capacity(queue_name, DEFAULT_CAPACITY)
    }

    /// Create a sender that retains at most `capacity` messages (minimum 1),
    /// dropping the oldest once full
    pub fn with_capacity(queue_name: impl Into<String>, capacity: usize) -> Self {
        let queue_name = queue_name.into();
        let capacity = capacity.max(1);
        info!(queue = %queue_name, capacity, "Initializing in-memory sender");
        Self {
            queue_name,
            capacity,
            retained: Mutex::new(Retained {
                messages: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
                accepted: 0,
            }),
        }
    }

    /// Snapshot of the retained messages, oldest first
    pub fn sent(&self) -> Vec<EnqueuedMessage> {
        self.retained.lock().messages.iter().cloned().collect()
    }

    /// Number of messages currently retained
    pub fn len(&self) -> usize {
        self.retained.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.lock().messages.is_empty()
    }

    /// Number of messages accepted, including ones no longer retained
    pub fn accepted(&self) -> u64 {
        self.retained.lock().accepted
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[async_trait]
impl MessageSender for MemorySender {
    async fn send(&self, message: &Message) -> Result<()> {
        let entry = EnqueuedMessage {
            id: Uuid::new_v4(),
            message: message.clone(),
            enqueued_at: Utc::now(),
        };

        debug!(
            queue = %self.queue_name,
            message_id = %entry.id,
            "Message enqueued"
        );

        {
            let mut retained = self.retained.lock();
            if retained.messages.len() == self.capacity {
                retained.messages.pop_front();
            }
            retained.messages.push_back(entry);
            retained.accepted += 1;
        }

        Ok(())
    }

    fn queue_name(&self) -> &str {
        &self.queue_name
    }
}
