//! Error types for the cluster API client.
//!
//! # Design
//! `Application` is the only variant produced by a response the server meant
//! to send: the envelope arrived intact and its status says the call failed.
//! Every other variant is a transport-level failure. The silent call surface
//! of `RequestClient` treats both kinds alike; `is_application` lets strict
//! callers and sinks tell them apart.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The envelope status fell outside the success range.
    #[error("application error {status}: {message}")]
    Application { status: i64, message: String },

    /// The server answered with a non-2xx HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body was not an envelope, or `data` had the wrong shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn is_application(&self) -> bool {
        matches!(self, ApiError::Application { .. })
    }
}
