//! The central JSON-RPC engine
//!
//! Validates incoming messages, resolves their method through the registry, invokes the
//! resolved handler, and writes an audit line for every call.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::dispatch::{ChannelId, RequestContext};
use crate::rpc::protocol::{
    app_error_to_json_rpc, is_json_rpc_error, is_valid_request_id, json_rpc_error,
    json_rpc_result, INVALID_REQUEST, JSONRPC_VERSION,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
struct JsonRpcMessage {
    jsonrpc: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
}

pub async fn handle_json_rpc_value(
    state: &AppState,
    channel_id: ChannelId,
    payload: Value,
) -> Option<Value> {
    let Some(object) = payload.as_object() else {
        return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
    };

    // `"id": null` is still a request; only an absent id marks a notification.
    let request_id = object.get("id").cloned();
    if let Some(id) = request_id.as_ref() {
        if !is_valid_request_id(id) {
            return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
        }
    }

    let parsed: JsonRpcMessage = match serde_json::from_value(payload) {
        Ok(message) => message,
        Err(_) => return Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request")),
    };

    if parsed.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
        return Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request"));
    }

    let Some(method) = parsed.method.filter(|method| !method.trim().is_empty()) else {
        // Responses and blank methods are never dispatched.
        return request_id
            .map(|id| json_rpc_error(Some(id), INVALID_REQUEST, "Invalid Request"));
    };

    let is_notification = request_id.is_none();
    let response =
        handle_json_rpc_request(state, channel_id, request_id, method, parsed.params).await;

    if is_notification {
        None
    } else {
        Some(response)
    }
}

pub async fn handle_json_rpc_request(
    state: &AppState,
    channel_id: ChannelId,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
) -> Value {
    let audit_params = redact_audit_params(params.as_ref());
    let registry = Arc::clone(&state.registry);
    let descriptor = registry.lookup(method.as_bytes());

    if descriptor.is_missing() {
        warn!(method = %method, channel_id = %channel_id, "unknown rpc method");
    }

    let ctx = RequestContext {
        method: method.as_str().into(),
        channel_id,
        registry: Arc::clone(&registry),
    };
    let response = match descriptor
        .invoke(ctx, params.unwrap_or_else(|| Value::Array(Vec::new())))
        .await
    {
        Ok(result) => json_rpc_result(id, result),
        Err(err) => app_error_to_json_rpc(id, err),
    };

    info!(
        method = %method,
        channel_id = %channel_id,
        params = %audit_params,
        outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
        "rpc call audited"
    );

    response
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    params.map(redact_audit_value).unwrap_or(Value::Null)
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "authorization" | "bearer" | "api_key" | "apikey" | "passphrase"
    ) || normalized.contains("token")
        || normalized.contains("secret")
        || normalized.contains("password")
        || normalized.contains("credential")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use super::{handle_json_rpc_value, redact_audit_params};
    use crate::dispatch::{ChannelId, HandlerResult, InputChannelTracker, MethodRegistry};
    use crate::AppState;

    fn state() -> AppState {
        let mut builder = MethodRegistry::builder();
        builder
            .register("echo", |_ctx, params: Value| async move { HandlerResult::Ok(params) })
            .expect("register echo")
            .register("whoami", |ctx, _params| async move {
                HandlerResult::Ok(json!(ctx.channel_id))
            })
            .expect("register whoami");
        AppState::new(
            "token".to_string(),
            Arc::new(builder.build()),
            InputChannelTracker::new(),
        )
    }

    #[test]
    fn redacts_sensitive_fields_in_audit_params() {
        let params = json!({
            "keys": "iabc<Esc>",
            "auth": {
                "access_token": "should-not-appear",
                "api_key": "should-not-appear",
                "nested": {
                    "secret": "should-not-appear"
                }
            }
        });

        let redacted = redact_audit_params(Some(&params));

        assert_eq!(redacted["keys"], json!("iabc<Esc>"));
        assert_eq!(redacted["auth"]["access_token"], json!("[REDACTED]"));
        assert_eq!(redacted["auth"]["api_key"], json!("[REDACTED]"));
        assert_eq!(redacted["auth"]["nested"]["secret"], json!("[REDACTED]"));
    }

    #[tokio::test]
    async fn dispatches_to_registered_handler() {
        let response = handle_json_rpc_value(
            &state(),
            ChannelId::new(4),
            json!({"jsonrpc": "2.0", "id": 1, "method": "echo", "params": [1, "two"]}),
        )
        .await
        .expect("response");

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"], json!([1, "two"]));
    }

    #[tokio::test]
    async fn passes_channel_to_handler_and_defaults_params() {
        let response = handle_json_rpc_value(
            &state(),
            ChannelId::new(12),
            json!({"jsonrpc": "2.0", "id": "w", "method": "whoami"}),
        )
        .await
        .expect("response");

        assert_eq!(response["id"], "w");
        assert_eq!(response["result"], 12);

        let echoed = handle_json_rpc_value(
            &state(),
            ChannelId::NONE,
            json!({"jsonrpc": "2.0", "id": 2, "method": "echo"}),
        )
        .await
        .expect("response");
        assert_eq!(echoed["result"], json!([]));
    }

    #[tokio::test]
    async fn unknown_method_is_a_correlated_error() {
        let response = handle_json_rpc_value(
            &state(),
            ChannelId::new(1),
            json!({"jsonrpc": "2.0", "id": 77, "method": "nonexistent_method"}),
        )
        .await
        .expect("response");

        assert_eq!(response["id"], 77);
        assert_eq!(response["error"]["code"], -32601);
        assert!(response["error"]["data"]["message"]
            .as_str()
            .expect("message")
            .contains("nonexistent_method"));
    }

    #[tokio::test]
    async fn notifications_produce_no_response() {
        let response = handle_json_rpc_value(
            &state(),
            ChannelId::new(1),
            json!({"jsonrpc": "2.0", "method": "nonexistent_method"}),
        )
        .await;

        assert!(response.is_none());
    }

    #[tokio::test]
    async fn rejects_wrong_version_and_blank_method() {
        let wrong_version = handle_json_rpc_value(
            &state(),
            ChannelId::NONE,
            json!({"jsonrpc": "1.0", "id": 1, "method": "echo"}),
        )
        .await
        .expect("response");
        assert_eq!(wrong_version["error"]["code"], -32600);

        let blank = handle_json_rpc_value(
            &state(),
            ChannelId::NONE,
            json!({"jsonrpc": "2.0", "id": 2, "method": "  "}),
        )
        .await
        .expect("response");
        assert_eq!(blank["error"]["code"], -32600);
        assert_eq!(blank["id"], 2);

        let not_object = handle_json_rpc_value(&state(), ChannelId::NONE, json!(5))
            .await
            .expect("response");
        assert_eq!(not_object["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn rejects_response_objects() {
        let response = handle_json_rpc_value(
            &state(),
            ChannelId::NONE,
            json!({"jsonrpc": "2.0", "id": 3, "result": {}}),
        )
        .await
        .expect("response");

        assert_eq!(response["error"]["code"], -32600);
        assert_eq!(response["id"], 3);
    }
}
