//! Response envelopes and the error type every handler returns.

use crate::{identity::ProviderError, serializer::SerializeError};
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

const PROVIDER_UNAVAILABLE: &str = "Identity provider unavailable";
const INTERNAL_ERROR: &str = "Internal server error";

/// Success envelope: a human readable message plus the serialized record.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq)]
pub struct Envelope {
    pub message: String,
    #[schema(value_type = Object)]
    pub data: Value,
}

impl Envelope {
    #[must_use]
    pub fn new(message: impl Into<String>, data: Value) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Error envelope.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorDetail {
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Body missing, malformed, or not JSON; carries axum's own status.
    #[error("{detail}")]
    Payload { status: StatusCode, detail: String },
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Payload { status, .. } => *status,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Provider(ProviderError::Api { status, .. }) if status.is_client_error() => {
                *status
            }
            Self::Provider(ProviderError::Api { .. } | ProviderError::Request(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Provider(ProviderError::Decode(_)) => StatusCode::BAD_GATEWAY,
            Self::Provider(ProviderError::Config(_)) | Self::Serialize(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Text returned to the caller; provider 4xx messages are relayed as is,
    /// everything server-side is reduced to a generic message.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Payload { detail, .. } => detail.clone(),
            Self::BadRequest(detail) | Self::Unauthorized(detail) | Self::Validation(detail) => {
                detail.clone()
            }
            Self::Provider(ProviderError::Api { status, message }) if status.is_client_error() => {
                message.clone()
            }
            Self::Provider(ProviderError::Api { .. } | ProviderError::Request(_)) => {
                PROVIDER_UNAVAILABLE.to_string()
            }
            Self::Provider(ProviderError::Decode(_)) => {
                "Invalid identity provider response".to_string()
            }
            Self::Provider(ProviderError::Config(_)) | Self::Serialize(_) => {
                INTERNAL_ERROR.to_string()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Payload {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("request failed: {}", self);
        } else {
            warn!("request rejected ({}): {}", status, self);
        }

        (
            status,
            Json(ErrorDetail {
                detail: self.detail(),
            }),
        )
            .into_response()
    }
}
