//! Error responses and the unified error type.
//!
//! Every error this service sends is a JSON body of the shape
//! `{"statusCode": 404, "message": "API not found"}`, and the constructors
//! here are the only place that shape is written down. They format and
//! assign — nothing else. Logging a failure is the pipeline's job, and it
//! happens before this module is asked for the response.

use std::fmt;

use http::StatusCode;

use crate::response::Response;

pub(crate) const DEFAULT_ERROR_MSG: &str = "An Error occurred";
pub(crate) const INVALID_ARGS_MSG: &str = "Invalid Arguments";
pub(crate) const INVALID_ROUTE_MSG: &str = "API not found";
pub(crate) const INTERNAL_ERROR_MSG: &str = "Internal Server Error";

// ── Error responses ───────────────────────────────────────────────────────────

/// Builds an error [`Response`] with the uniform JSON body.
///
/// `message` falls back to `"An Error occurred"` when `None`.
///
/// # Panics
///
/// Panics unless `status` is a 4xx or 5xx code. A non-error status here is a
/// bug in the caller, not a runtime condition.
pub fn error_response(status: StatusCode, message: Option<&str>) -> Response {
    let code = status.as_u16();
    assert!(
        (400..600).contains(&code),
        "error status must be 4xx or 5xx, got {code}"
    );

    let body = serde_json::json!({
        "statusCode": code,
        "message": message.unwrap_or(DEFAULT_ERROR_MSG),
    });
    Response::builder()
        .status(status)
        .json(body.to_string().into_bytes())
}

/// `400 Bad Request` for input that failed validation.
///
/// `message` falls back to `"Invalid Arguments"` when `None`.
pub fn invalid_args(message: Option<&str>) -> Response {
    error_response(
        StatusCode::BAD_REQUEST,
        Some(message.unwrap_or(INVALID_ARGS_MSG)),
    )
}

/// `404 Not Found` for paths no handler claims. Wired in after route lookup.
pub fn invalid_route() -> Response {
    error_response(StatusCode::NOT_FOUND, Some(INVALID_ROUTE_MSG))
}

/// `500 Internal Server Error` for failures nothing else caught.
///
/// The body is deliberately fixed: failure detail goes to the log, never to
/// the client.
pub fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, Some(INTERNAL_ERROR_MSG))
}

// ── Unified error type ────────────────────────────────────────────────────────

/// The error type carried through the request pipeline.
///
/// Client-caused conditions (400, 404) are expressed as [`Response`] values,
/// never as `Error`s. An `Error` reaching the end of the pipeline means the
/// request failed in a way the client must not see the details of: it is
/// logged in full and answered with [`internal_error`].
#[derive(Debug)]
pub enum Error {
    /// Socket-level failure: binding the listen address or accepting a
    /// connection.
    Io(std::io::Error),
    /// The request body could not be read from the transport.
    BodyRead(String),
    /// A response body failed to serialize.
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::BodyRead(e) => write!(f, "body read: {e}"),
            Self::Json(e) => write!(f, "json: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::BodyRead(_) => None,
            Self::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
