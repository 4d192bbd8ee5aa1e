//! HTTP error responses.
//!
//! Every failure leaves the service as `{ "error": "<message>" }`. Validation
//! errors echo their own message; dependency faults are logged with full
//! detail and answered with a fixed message.

use crate::error::Page2MdError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    /// `public` goes to the caller, `detail` only to the log.
    #[error("{public}")]
    Internal { public: String, detail: String },
}

impl ApiError {
    pub fn internal(public: impl Into<String>, detail: impl ToString) -> Self {
        ApiError::Internal {
            public: public.into(),
            detail: detail.to_string(),
        }
    }

    /// Map a failure of the transcribe-image operation.
    pub fn transcription(err: Page2MdError) -> Self {
        let public = match &err {
            Page2MdError::LlmApiError { .. } => "The model call failed",
            Page2MdError::ApiTimeout { .. } => "The model call timed out",
            Page2MdError::ProviderNotConfigured { .. } => "No model provider is configured",
            _ => "Failed to transcribe image",
        };
        Self::classify(err, public)
    }

    /// Map a failure of the convert-file operation.
    pub fn conversion(err: Page2MdError) -> Self {
        Self::classify(err, "Failed to convert file")
    }

    fn classify(err: Page2MdError, public: &str) -> Self {
        match err {
            Page2MdError::FileTooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            e if e.is_client_error() => ApiError::BadRequest(e.to_string()),
            e => ApiError::internal(public, e),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal { public, detail } => {
                tracing::error!(%detail, "request failed");
                public
            }
            ApiError::BadRequest(msg) | ApiError::PayloadTooLarge(msg) => {
                tracing::warn!(%msg, "request rejected");
                msg
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
