//! Editor API surface exposed over RPC
//!
//! `register_api_methods` is the single place where every method name is bound to its
//! handler. It runs once at startup, before the registry is frozen.

pub mod buffer;
pub mod params;
pub mod vim;
pub mod window;

use std::{future::Future, sync::Arc};

use serde_json::Value;

use crate::dispatch::{
    HandlerResult, InputChannelTracker, MethodRegistry, RegistrationError, RegistryBuilder,
    RequestContext,
};
use crate::workspace::Workspace;

pub fn register_api_methods(
    builder: &mut RegistryBuilder,
    workspace: &Arc<Workspace>,
    input_tracker: &InputChannelTracker,
) -> Result<(), RegistrationError> {
    vim::register(builder, workspace, input_tracker)?;
    buffer::register(builder, workspace)?;
    window::register(builder, workspace)?;
    Ok(())
}

/// Builds the frozen registry holding the whole API surface.
pub fn build_registry(
    workspace: &Arc<Workspace>,
    input_tracker: &InputChannelTracker,
) -> Result<MethodRegistry, RegistrationError> {
    let mut builder = MethodRegistry::builder();
    register_api_methods(&mut builder, workspace, input_tracker)?;
    Ok(builder.build())
}

/// Adapts a workspace-only handler to the registry's handler signature.
pub(crate) fn with_workspace<F, Fut>(
    workspace: &Arc<Workspace>,
    handler: F,
) -> impl Fn(RequestContext, Value) -> Fut + Send + Sync + 'static
where
    F: Fn(Arc<Workspace>, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    let workspace = Arc::clone(workspace);
    move |_ctx: RequestContext, params: Value| handler(Arc::clone(&workspace), params)
}
