//! Window methods

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{
    params::{parse_params, to_result},
    with_workspace,
};
use crate::dispatch::{HandlerResult, RegistrationError, RegistryBuilder};
use crate::workspace::{WindowHandle, Workspace};

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub window: WindowHandle,
}

#[derive(Debug, Deserialize)]
pub struct SetCursorParams {
    pub window: WindowHandle,
    pub pos: (usize, usize),
}

pub fn register(
    builder: &mut RegistryBuilder,
    workspace: &Arc<Workspace>,
) -> Result<(), RegistrationError> {
    builder
        .register("window_get_buffer", with_workspace(workspace, get_buffer))?
        .register("window_get_cursor", with_workspace(workspace, get_cursor))?
        .register("window_set_cursor", with_workspace(workspace, set_cursor))?;
    Ok(())
}

async fn get_buffer(workspace: Arc<Workspace>, params: Value) -> HandlerResult {
    let params: WindowParams = parse_params(params)?;
    to_result(workspace.window_buffer(params.window).await?)
}

async fn get_cursor(workspace: Arc<Workspace>, params: Value) -> HandlerResult {
    let params: WindowParams = parse_params(params)?;
    let cursor = workspace.cursor(params.window).await?;
    Ok(json!([cursor.row, cursor.col]))
}

async fn set_cursor(workspace: Arc<Workspace>, params: Value) -> HandlerResult {
    let params: SetCursorParams = parse_params(params)?;
    let (row, col) = params.pos;
    workspace.set_cursor(params.window, row, col).await?;
    Ok(Value::Null)
}
