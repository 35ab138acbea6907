use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized: {message}")]
    Unauthorized {
        code: &'static str,
        message: &'static str,
    },
    #[error("bad request: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("invalid method: {method}")]
    UnknownMethod { method: String },
    #[error("internal error")]
    Internal { code: &'static str, message: String },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl AppError {
    pub fn unauthorized(code: &'static str, message: &'static str) -> Self {
        Self::Unauthorized { code, message }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn unknown_method(method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            method: method.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: "internal_error",
            message: message.into(),
        }
    }

    /// Stable machine-readable error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized { code, .. }
            | Self::BadRequest { code, .. }
            | Self::Internal { code, .. } => code,
            Self::UnknownMethod { .. } => "unknown_method",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            Self::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, json!({})),
            Self::BadRequest { .. } => (StatusCode::BAD_REQUEST, json!({})),
            Self::UnknownMethod { method } => (StatusCode::NOT_FOUND, json!({ "method": method })),
            Self::Internal { message, .. } => {
                tracing::error!(error = %message, "request failed with internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({}))
            }
        };

        let message = match &self {
            Self::Internal { .. } => "internal server error".to_string(),
            Self::Unauthorized { message, .. } => message.to_string(),
            Self::BadRequest { message, .. } => message.clone(),
            Self::UnknownMethod { .. } => self.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                code: self.code().to_string(),
                message,
                details,
            }),
        )
            .into_response()
    }
}
