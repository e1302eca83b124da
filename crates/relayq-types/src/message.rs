//! Message types for RelayQ
//!
//! Defines the broker-bound Message struct.

use chrono::{DateTime, Utc};

/// A message ready to be enqueued on the broker
///
/// Constructed fresh for each request and discarded after submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message body text
    body: String,

    /// Session the message belongs to (never empty)
    session_id: Option<String>,

    /// Deferred-visibility timestamp
    scheduled_enqueue_time: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a new message with the given body
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            session_id: None,
            scheduled_enqueue_time: None,
        }
    }

    /// Set session ID. An empty ID leaves the message without a session.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        self.session_id = (!session_id.is_empty()).then_some(session_id);
        self
    }

    /// Set the time before which the broker keeps the message hidden
    pub fn with_scheduled_enqueue_time(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_enqueue_time = Some(at);
        self
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn scheduled_enqueue_time(&self) -> Option<DateTime<Utc>> {
        self.scheduled_enqueue_time
    }

    /// Whether the broker will defer delivery of this message
    pub fn is_scheduled(&self) -> bool {
        self.scheduled_enqueue_time.is_some()
    }
}
