//! Handler errors and their HTTP responses
//!
//! Every error becomes a JSON body with an `error` field. Storage failures
//! also carry the underlying message in `details`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bookshelf_core::StorageError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}: {source}")]
    Storage {
        message: &'static str,
        #[source]
        source: StorageError,
    },
}

impl ApiError {
    /// Wrap a storage failure with the message shown to the client
    pub fn storage(message: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| ApiError::Storage { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::NotFound(message) => ErrorBody {
                error: message.to_string(),
                details: None,
            },
            ApiError::BadRequest(message) => ErrorBody {
                error: message,
                details: None,
            },
            ApiError::Storage { message, source } => {
                error!("{}: {}", message, source);
                if let Some(hint) = source.recovery_suggestion() {
                    warn!("{}", hint);
                }
                ErrorBody {
                    error: message.to_string(),
                    details: Some(source.to_string()),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}
