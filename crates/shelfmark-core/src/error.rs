//! Error types and handling for shelfmark-core operations.
//!
//! All resolution failures (no search match, pattern mismatch, network
//! trouble after the single retry) are degraded to "no result" by the
//! resolvers themselves; the variants here surface only where an operation
//! genuinely cannot continue, such as an unwritable settings record.

use thiserror::Error;

/// The main error type for shelfmark-core operations.
///
/// All public functions in shelfmark-core return `Result<T, Error>` for
/// consistent error handling. `Display` provides user-friendly messages while
/// the source chain is preserved for the wrapped I/O and network variants.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers filesystem operations on the per-book settings record and the
    /// configuration file. The underlying `std::io::Error` is preserved.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// Covers HTTP requests against the identifier and reference-page search
    /// services. A `Connection` only returns this after its one
    /// reconnect-and-retry has also failed; resolvers treat it as "no
    /// result" rather than propagating it.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A response page did not contain an expected structure.
    ///
    /// Raised when a search response parses as HTML but the result container
    /// or extraction pattern cannot be applied at all. A pattern that simply
    /// matches nothing is not an error; it yields an empty result.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Settings-record storage operation failed.
    ///
    /// Covers reading, writing, and committing the per-book JSON record
    /// beyond plain I/O, e.g. a record that exists but cannot be decoded.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The book database collaborator rejected or lacked a request field.
    ///
    /// Used by `BookDatabase` implementations when a book id is unknown or a
    /// required field is missing.
    #[error("Library error: {0}")]
    Library(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// Returns `true` for errors that are typically temporary: network
    /// timeouts, connection failures, and interrupted I/O. Parse, storage,
    /// and configuration errors are permanent.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier, for logging.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Library(_) => "library",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
