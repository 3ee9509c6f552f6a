//! Error responses.
//!
//! Every failure leaves the API as
//! `{"success": false, "error": <status>, "message": <text>}`. Authorization
//! failures keep their own status and message; business failures use the
//! generic messages below.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use coffeeshop_auth::AuthorizationFailure;
use coffeeshop_infra::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationFailure),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("resource not found")]
    NotFound,

    #[error("unprocessable: {0}")]
    Unprocessable(String),

    #[error("server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: u16,
    message: &'a str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(failure) => {
                StatusCode::from_u16(failure.status()).unwrap_or(StatusCode::UNAUTHORIZED)
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent to the client; details stay in the logs.
    pub fn public_message(&self) -> &str {
        match self {
            ApiError::Unauthorized(failure) => failure.message(),
            ApiError::BadRequest(_) => "bad request",
            ApiError::NotFound => "resource not found",
            ApiError::Unprocessable(_) => "unprocessable",
            ApiError::Internal(_) => "server_error",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            StoreError::DuplicateTitle(_) | StoreError::Invalid(_) => {
                ApiError::Unprocessable(err.to_string())
            }
            StoreError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

// Undecodable bodies are bad requests; well-formed JSON that is not a drink
// is unprocessable.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(_) => ApiError::Unprocessable(rejection.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

// Ids are integers; anything else names no drink.
impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::NotFound
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(detail) => tracing::error!(detail = %detail, "request failed"),
            ApiError::Unauthorized(_) | ApiError::NotFound => {}
            other => tracing::debug!(error = %other, "request rejected"),
        }

        let body = ErrorBody {
            success: false,
            error: status.as_u16(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
