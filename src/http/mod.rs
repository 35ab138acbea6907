//! HTTP transport for the RPC endpoint
//!
//! Provides the `/rpc` listener together with health and discovery endpoints.

pub mod handlers;
