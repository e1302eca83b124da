//! RelayQ Types - Shared domain types for the send gateway
//!
//! This crate contains the inbound request shape, the outbound broker
//! message and the error type used across RelayQ components.

pub mod error;
pub mod message;
pub mod request;

// Re-export commonly used types
pub use error::{Error, Result};
pub use message::Message;
pub use request::SendRequest;
