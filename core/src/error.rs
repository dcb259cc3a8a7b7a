//! Error types for the todo sync client.
//!
//! # Design
//! `ApiError` is `Clone` because a single failed list fetch is handed to
//! every caller that joined it. Transport and status failures keep only
//! their text; nothing here interprets an error body beyond exposing it.

use thiserror::Error;

/// Errors returned by the remote store, the cache and the mutation flows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never completed (DNS, connect, reset, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {code}: {message}")]
    HttpStatus { code: u16, message: String },

    /// A local form constraint failed. Never leaves the client.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The form already has a submission in flight.
    #[error("a submission is already in progress")]
    Pending,
}

impl ApiError {
    /// Status code of an `HttpStatus` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Local form constraint violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must be at least {min} characters (got {actual})")]
    TitleTooShort { min: usize, actual: usize },

    #[error("unknown priority: {0:?}")]
    UnknownPriority(String),

    #[error("unknown form field: {0:?}")]
    UnknownField(String),

    #[error("todo is already completed")]
    AlreadyCompleted,
}
