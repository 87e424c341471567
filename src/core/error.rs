//! Error types for the Zonic engine

use thiserror::Error;

/// Main error type for the engine
///
/// Invalid-argument and lifecycle failures are returned synchronously to the
/// caller and never corrupt engine state. User-callback panics are not
/// errors: they are caught at the dispatch boundary, logged, and suppressed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("lifecycle error: {0}")]
    Lifecycle(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn lifecycle(msg: impl Into<String>) -> Self {
        Error::Lifecycle(msg.into())
    }
}
