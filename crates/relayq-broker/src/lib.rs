//! RelayQ Broker - Broker client adapters for the send gateway
//!
//! This crate provides pluggable message senders.
//! Currently supports:
//! - Azure Service Bus over its HTTP send API (default)
//! - In-memory sender (for development/testing)

pub mod traits;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "servicebus")]
pub mod connection;

#[cfg(feature = "servicebus")]
pub mod servicebus;

// Re-exports
pub use traits::MessageSender;

#[cfg(feature = "memory")]
pub use memory::{EnqueuedMessage, MemorySender, DEFAULT_CAPACITY};

#[cfg(feature = "servicebus")]
pub use connection::{ConnectionString, SharedAccessKey};

#[cfg(feature = "servicebus")]
pub use servicebus::{SenderOptions, ServiceBusSender};
