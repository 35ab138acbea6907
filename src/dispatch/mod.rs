//! Method dispatch core
//!
//! Resolves wire-format method names to their handlers and remembers which channel
//! last injected input.

pub mod registry;
pub mod tracker;

pub use registry::{
    HandlerDescriptor, HandlerResult, MethodName, MethodRegistry, RegistrationError,
    RegistryBuilder, RequestContext, RpcHandler,
};
pub use tracker::{ChannelId, InputChannelTracker};
