//! RelayQ Core - Request-to-message logic for the send gateway
//!
//! This crate contains:
//! - Builder: translation of an inbound request into a broker message
//! - Gateway: build-then-enqueue orchestration over a shared sender

pub mod builder;
pub mod gateway;

// Re-exports
pub use builder::build;
pub use gateway::Gateway;
