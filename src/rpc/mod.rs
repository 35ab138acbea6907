//! JSON-RPC 2.0 message handling
//!
//! Provides request validation, response formatting, and routing of every call through the
//! method registry.

pub mod protocol;
pub mod server;
