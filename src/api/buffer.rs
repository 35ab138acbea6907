//! Buffer methods

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::api::{
    params::{parse_params, to_result},
    with_workspace,
};
use crate::dispatch::{HandlerResult, RegistrationError, RegistryBuilder};
use crate::workspace::{BufferHandle, Workspace};

#[derive(Debug, Deserialize)]
pub struct BufferParams {
    pub buffer: BufferHandle,
}

#[derive(Debug, Deserialize)]
pub struct GetLinesParams {
    pub buffer: BufferHandle,
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub strict_indexing: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetLinesParams {
    pub buffer: BufferHandle,
    pub start: i64,
    pub end: i64,
    pub strict_indexing: bool,
    pub replacement: Vec<String>,
}

pub fn register(
    builder: &mut RegistryBuilder,
    workspace: &Arc<Workspace>,
) -> Result<(), RegistrationError> {
    builder
        .register("buffer_line_count", with_workspace(workspace, line_count))?
        .register("buffer_get_name", with_workspace(workspace, get_name))?
        .register("buffer_get_lines", with_workspace(workspace, get_lines))?
        .register("buffer_set_lines", with_workspace(workspace, set_lines))?
        .register("buffer_delete", with_workspace(workspace, delete))?;
    Ok(())
}

async fn line_count(workspace: Arc<Workspace>, params: Value) -> HandlerResult {
    let params: BufferParams = parse_params(params)?;
    to_result(workspace.line_count(params.buffer).await?)
}

async fn get_name(workspace: Arc<Workspace>, params: Value) -> HandlerResult {
    let params: BufferParams = parse_params(params)?;
    to_result(workspace.buffer_name(params.buffer).await?)
}

async fn get_lines(workspace: Arc<Workspace>, params: Value) -> HandlerResult {
    let params: GetLinesParams = parse_params(params)?;
    let lines = workspace
        .get_lines(
            params.buffer,
            params.start,
            params.end,
            params.strict_indexing,
        )
        .await?;
    to_result(lines)
}

async fn set_lines(workspace: Arc<Workspace>, params: Value) -> HandlerResult {
    let params: SetLinesParams = parse_params(params)?;
    workspace
        .set_lines(
            params.buffer,
            params.start,
            params.end,
            params.strict_indexing,
            params.replacement,
        )
        .await?;
    Ok(Value::Null)
}

async fn delete(workspace: Arc<Workspace>, params: Value) -> HandlerResult {
    let params: BufferParams = parse_params(params)?;
    workspace.delete_buffer(params.buffer).await?;
    Ok(Value::Null)
}
