//! JSON-RPC response formatting
//!
//! Maps internal `AppError`s onto JSON-RPC error objects.

use serde_json::{json, Value};

use crate::errors::AppError;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn app_error_to_json_rpc(id: Option<Value>, err: AppError) -> Value {
    let code = err.code();
    match err {
        AppError::BadRequest { message, .. } => json_rpc_error_with_data(
            id,
            INVALID_PARAMS,
            "Invalid params",
            Some(json!({
                "code": code,
                "message": message,
                "details": {}
            })),
        ),
        AppError::UnknownMethod { ref method } => {
            let details = json!({ "method": method });
            json_rpc_error_with_data(
                id,
                METHOD_NOT_FOUND,
                "Method not found",
                Some(json!({
                    "code": code,
                    "message": err.to_string(),
                    "details": details
                })),
            )
        }
        // Authentication happens at the HTTP layer; a handler returning this is a bug.
        AppError::Unauthorized { message, .. } => {
            tracing::error!(error = %message, "rpc handler returned an authentication error");
            json_rpc_error(id, INTERNAL_ERROR, "Internal error")
        }
        AppError::Internal { message, .. } => {
            tracing::error!(error = %message, "rpc call failed with internal error");
            json_rpc_error(id, INTERNAL_ERROR, "Internal error")
        }
    }
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let mut error = json!({
        "code": code,
        "message": message
    });
    if let Some(data) = data {
        error["data"] = data;
    }

    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id.unwrap_or(Value::Null),
        "error": error
    })
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id.unwrap_or(Value::Null),
        "result": result
    })
}

/// Request ids must be strings, numbers, or null.
pub fn is_valid_request_id(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Null)
}
