//! Error taxonomy for entity operations.
//!
//! Callers reconcile on [`Error::kind`]: `NotFound` on read/delete means the
//! entity has already converged, `AlreadyExists` on create is a conflict, and
//! `Invalid`/`Api` always surface. Transport failures are kept apart from
//! remote domain errors so they are never mistaken for one.

use thiserror::Error;

use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, Error>;

/// Closed set of error kinds used for control-flow dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Invalid,
    Api,
    /// Network, protocol or decoding failure below the domain layer.
    Transport,
    /// The remote returned a result variant this client does not know.
    UnexpectedResult,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{what} {key}={value} not found")]
    NotFound {
        what: String,
        key: String,
        value: String,
    },

    #[error("{what} {key}={value} already exists")]
    AlreadyExists {
        what: String,
        key: String,
        value: String,
    },

    /// Local precondition violation; never retried.
    #[error("invalid {what}: {message}")]
    Invalid { what: String, message: String },

    /// Remote domain error, preserved verbatim.
    #[error("typename({typename}): {message}")]
    Api { typename: String, message: String },

    #[error("unexpected result type ({typename}) from {operation}")]
    UnexpectedResult { operation: String, typename: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    pub fn not_found(what: &str, key: &str, value: impl ToString) -> Self {
        Self::NotFound {
            what: what.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn already_exists(what: &str, key: &str, value: impl ToString) -> Self {
        Self::AlreadyExists {
            what: what.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn invalid(what: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            what: what.to_string(),
            message: message.into(),
        }
    }

    pub fn api(typename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            typename: typename.into(),
            message: message.into(),
        }
    }

    pub fn unexpected(operation: &str, typename: impl Into<String>) -> Self {
        Self::UnexpectedResult {
            operation: operation.to_string(),
            typename: typename.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Invalid { .. } => ErrorKind::Invalid,
            Self::Api { .. } => ErrorKind::Api,
            Self::UnexpectedResult { .. } => ErrorKind::UnexpectedResult,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind() == ErrorKind::AlreadyExists
    }
}

/// Absorb a `NotFound` into `None`, passing every other outcome through.
///
/// Used by readers that treat a missing entity as "already converged".
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for Result<T> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}
