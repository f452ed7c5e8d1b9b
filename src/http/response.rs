//! Mapping call outcomes onto HTTP responses.
//!
//! Reply and status metadata become response headers; errors carry a JSON
//! body `{code, message}` and an HTTP status derived from the code.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::pipeline::{CallResult, Code};

/// Error body returned to HTTP callers.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

pub fn http_status(code: Code) -> StatusCode {
    match code {
        Code::InvalidArgument => StatusCode::BAD_REQUEST,
        Code::Unauthenticated => StatusCode::UNAUTHORIZED,
        Code::PermissionDenied => StatusCode::FORBIDDEN,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
        Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn into_http_response(result: CallResult) -> Response {
    match result {
        Ok(mut reply) => {
            let headers = std::mem::take(reply.metadata_mut());
            (
                StatusCode::OK,
                headers,
                [(header::CONTENT_TYPE, "application/json")],
                reply.into_payload(),
            )
                .into_response()
        }
        Err(mut status) => {
            let headers = std::mem::take(status.metadata_mut());
            let body = ErrorBody {
                code: status.code().to_string(),
                message: status.message().to_string(),
            };
            (http_status(status.code()), headers, Json(body)).into_response()
        }
    }
}
