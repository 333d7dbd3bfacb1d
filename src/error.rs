//! Typed failures of the request pipeline.
//!
//! Validators and handlers fail with an [`Error`]; the pipeline turns it into
//! a status code and a plain-text body. Storage errors keep their detail for
//! the logs but are answered with a generic message, so nothing from the
//! SQLite layer reaches a client.
//!
//! # Examples
//!
//! ```
//! use projboard::Error;
//!
//! let err = Error::bad_request("pid must be an integer");
//! assert_eq!(err.status_code(), 400);
//! assert_eq!(err.public_message(), "Bad request: pid must be an integer");
//!
//! assert_eq!(Error::NotFound.status_code(), 404);
//! assert_eq!(Error::NotFound.public_message(), "Item(s) not found");
//! ```

use crate::store::StoreError;
use crate::types::{InvalidId, UnknownColumn};

/// Body sent with every 404 produced by a handler.
pub const NOT_FOUND_MESSAGE: &str = "Item(s) not found";

/// Body sent with every 500.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Errors raised by validators and transaction handlers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed identifier, query option or mutation body. Never retried.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Well-formed request naming a row that does not exist.
    #[error("item(s) not found")]
    NotFound,

    /// The embedded store failed unexpectedly.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// Anything else that should never happen (panics, serialization).
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for [`Error::BadRequest`].
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::BadRequest(detail.into())
    }

    /// Shorthand for [`Error::Internal`].
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    /// HTTP status for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound => 404,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Plain-text body sent to the client.
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(detail) => format!("Bad request: {detail}"),
            Self::NotFound => NOT_FOUND_MESSAGE.to_string(),
            Self::Storage(_) | Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl From<InvalidId> for Error {
    fn from(err: InvalidId) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<UnknownColumn> for Error {
    fn from(err: UnknownColumn) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
