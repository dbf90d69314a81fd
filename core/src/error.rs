//! Error types for the todo client and the view's remote seam.
//!
//! # Design
//! `NotFound` and `Unauthorized` get dedicated variants because callers
//! distinguish "the todo does not exist" and "the session is gone" from
//! "the server returned an unexpected status." All other non-2xx responses
//! land in `HttpError` with the raw status code and body for debugging.

use thiserror::Error;

/// Errors returned by `TodoClient` parse methods and `RemoteCollection` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404, the requested todo does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server returned 401, or the session has been signed out.
    #[error("not signed in")]
    Unauthorized,

    /// The server returned a non-2xx status other than 401/404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The request never produced a response (connection refused, reset, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The subscription stream ended or was cut off by the service.
    #[error("subscription stream closed")]
    StreamClosed,
}
