//! Tagged result type shared by the engine, write buffer, and public API.

use std::fmt;
use std::io;

use thiserror::Error;

/// Errors that can escape the core. Mirrors the fault side of [`Status`];
/// the non-fault side (`NotFound`, `DeleteOrder`) is represented directly
/// by [`StatusKind`] since those are control values, not failures.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("compression failure: {0}")]
    Compression(String),

    #[error("write outside allocated memory: offset_chunk_compressed={offset_chunk_compressed} chunk_len={chunk_len} budget={budget}")]
    BoundsViolation {
        offset_chunk_compressed: u64,
        chunk_len: u64,
        budget: u64,
    },

    #[error("database is not open")]
    Closed,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// The tag half of [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Ok,
    NotFound,
    DeleteOrder,
    IoError,
    InvalidArgument,
}

/// A `Status` is what every engine, write-buffer, and public API call
/// returns: a kind plus an optional human-readable message, the way the
/// source system's `Status` object works.
#[derive(Debug, Clone)]
pub struct Status {
    kind: StatusKind,
    message: Option<String>,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            kind: StatusKind::Ok,
            message: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            kind: StatusKind::NotFound,
            message: None,
        }
    }

    pub fn delete_order() -> Self {
        Self {
            kind: StatusKind::DeleteOrder,
            message: None,
        }
    }

    pub fn io_error<S: Into<String>>(message: S) -> Self {
        Self {
            kind: StatusKind::IoError,
            message: Some(message.into()),
        }
    }

    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self {
            kind: StatusKind::InvalidArgument,
            message: Some(message.into()),
        }
    }

    pub fn kind(&self) -> StatusKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_ok(&self) -> bool {
        self.kind == StatusKind::Ok
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == StatusKind::NotFound
    }

    pub fn is_delete_order(&self) -> bool {
        self.kind == StatusKind::DeleteOrder
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(m) => write!(f, "{:?}: {m}", self.kind),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl std::error::Error for Status {}

impl From<DbError> for Status {
    fn from(err: DbError) -> Self {
        match err {
            DbError::InvalidArgument(m) => Status::invalid_argument(m),
            other => Status::io_error(other.to_string()),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
