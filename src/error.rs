//! Error types shared by the command handlers, the HTTP API and the MCP server.
//!
//! Internally the crate uses `anyhow` (see `Res`). Anything that leaves a command handler is
//! converted to the public `Error`, which remembers what kind of failure it was so that callers
//! can decide between a client error and a server error.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The public result type returned by command handlers.
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of an `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration or home directory is missing or invalid.
    Config,
    /// A database operation failed.
    Database,
    /// Reading or writing a file or socket failed.
    Io,
    /// The caller supplied an invalid request, e.g. an unknown report dimension.
    Request,
    /// The caller asked for something that does not exist, e.g. a page past the end.
    NotFound,
    /// A long-running service (HTTP or MCP) failed.
    Service,
}

serde_plain::derive_display_from_serialize!(ErrorType);

impl ErrorType {
    /// The process exit code used when the CLI exits with this kind of error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorType::Request | ErrorType::NotFound => 2,
            ErrorType::Config => 3,
            ErrorType::Database => 4,
            ErrorType::Io => 5,
            ErrorType::Service => 6,
        }
    }

    /// Whether the error was caused by the caller rather than by this program.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ErrorType::Request | ErrorType::NotFound)
    }
}

/// The public error type.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts an internal result into the public `Result` by tagging the error with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}
