//! Shared parameter decoding for API handlers

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{dispatch::HandlerResult, errors::AppError};

/// Decodes positional (`[..]`) or named (`{..}`) params into `T`.
pub fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, AppError> {
    serde_json::from_value(params)
        .map_err(|err| AppError::bad_request("invalid_params", err.to_string()))
}

pub fn to_result<T: Serialize>(value: T) -> HandlerResult {
    serde_json::to_value(value)
        .map_err(|err| AppError::internal(format!("failed to serialize result: {err}")))
}
