//! Axum HTTP handlers for the web server
//!
//! Provides the JSON-RPC endpoint and general metadata endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::Value;

use crate::dispatch::ChannelId;
use crate::errors::AppError;
use crate::rpc::protocol::{json_rpc_error, INVALID_REQUEST, PARSE_ERROR};
use crate::rpc::server::handle_json_rpc_value;
use crate::AppState;

pub const RPC_ENDPOINT: &str = "/rpc";
pub const CHANNEL_ID_HEADER: &str = "x-channel-id";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub rpc_endpoint: &'static str,
    pub methods: usize,
    pub last_input_channel: ChannelId,
    pub started_at_utc: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        rpc_endpoint: RPC_ENDPOINT,
        methods: state.registry.len(),
        last_input_channel: state.input_tracker.current(),
        started_at_utc: state
            .started_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Reads the caller's channel from `x-channel-id`; absent means no channel.
pub fn channel_id_from_headers(headers: &HeaderMap) -> Result<ChannelId, AppError> {
    let Some(raw) = headers.get(CHANNEL_ID_HEADER) else {
        return Ok(ChannelId::NONE);
    };

    raw.to_str()
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(ChannelId::new)
        .ok_or_else(|| {
            AppError::bad_request(
                "invalid_channel_id",
                "x-channel-id must be an unsigned 64-bit integer",
            )
        })
}

pub async fn rpc_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let channel_id = channel_id_from_headers(&headers)?;

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return Ok((
                StatusCode::OK,
                Json(json_rpc_error(None, PARSE_ERROR, "Parse error")),
            )
                .into_response())
        }
    };

    if let Value::Array(batch) = payload {
        if batch.is_empty() {
            return Ok((
                StatusCode::OK,
                Json(vec![json_rpc_error(None, INVALID_REQUEST, "Invalid Request")]),
            )
                .into_response());
        }

        let mut responses = Vec::new();
        for item in batch {
            if let Some(response) = handle_json_rpc_value(&state, channel_id, item).await {
                responses.push(response);
            }
        }

        if responses.is_empty() {
            return Ok(StatusCode::NO_CONTENT.into_response());
        }

        return Ok((StatusCode::OK, Json(Value::Array(responses))).into_response());
    }

    Ok(match handle_json_rpc_value(&state, channel_id, payload).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
