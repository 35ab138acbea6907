//! Global editor methods: input injection, API introspection, current buffer/window

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{
    params::{parse_params, to_result},
    with_workspace,
};
use crate::dispatch::{
    HandlerResult, InputChannelTracker, RegistrationError, RegistryBuilder, RequestContext,
};
use crate::workspace::Workspace;

#[derive(Debug, Deserialize)]
pub struct InputParams {
    pub keys: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateBufferParams {
    #[serde(default)]
    pub name: Option<String>,
}

pub fn register(
    builder: &mut RegistryBuilder,
    workspace: &Arc<Workspace>,
    input_tracker: &InputChannelTracker,
) -> Result<(), RegistrationError> {
    let input_workspace = Arc::clone(workspace);
    let input_channel = input_tracker.clone();
    let channel_reader = input_tracker.clone();
    let consume_workspace = Arc::clone(workspace);

    builder
        .register("input", move |ctx, params| {
            input(
                Arc::clone(&input_workspace),
                input_channel.clone(),
                ctx,
                params,
            )
        })?
        .register("consume_input", move |_ctx, _params| {
            let workspace = Arc::clone(&consume_workspace);
            async move { to_result(workspace.take_input().await) }
        })?
        .register("get_input_channel", move |_ctx, _params| {
            let current = channel_reader.current();
            async move { to_result(current) }
        })?
        .register("get_api_info", |ctx, _params| async move { api_info(&ctx) })?
        .register("create_buffer", with_workspace(workspace, create_buffer))?
        .register(
            "get_current_buffer",
            with_workspace(workspace, current_buffer),
        )?
        .register(
            "get_current_window",
            with_workspace(workspace, current_window),
        )?;
    Ok(())
}

/// Queues keys for the editor and remembers the calling channel as the input source.
async fn input(
    workspace: Arc<Workspace>,
    input_tracker: InputChannelTracker,
    ctx: RequestContext,
    params: Value,
) -> HandlerResult {
    let params: InputParams = parse_params(params)?;
    input_tracker.record(ctx.channel_id);
    to_result(workspace.push_input(&params.keys).await)
}

fn api_info(ctx: &RequestContext) -> HandlerResult {
    Ok(json!({
        "channel_id": ctx.channel_id,
        "methods": ctx.registry.method_names(),
    }))
}

async fn create_buffer(workspace: Arc<Workspace>, params: Value) -> HandlerResult {
    let params: CreateBufferParams = parse_params(params)?;
    to_result(workspace.create_buffer(params.name).await?)
}

async fn current_buffer(workspace: Arc<Workspace>, _params: Value) -> HandlerResult {
    to_result(workspace.current_buffer().await?)
}

async fn current_window(workspace: Arc<Workspace>, _params: Value) -> HandlerResult {
    to_result(workspace.current_window().await)
}
