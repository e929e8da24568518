//! Error types for the provider
//!
//! Every failure is terminal for the current operation. Resource handlers
//! wrap API errors with [`Error::context`] so the operator sees which step
//! failed, e.g. `Couldn't find SakuraCloud DNS resource: Resource not found: ...`.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the provider
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Attribute validation failed before any API call was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Remote resource (or record inside a zone) does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A record equal in (name, type, value, ttl) already exists in the zone
    #[error("Duplicate DNS record: {0}")]
    Duplicate(String),

    /// Data source filter matched nothing
    #[error("Your query returned no results. Please change your filters and try again.")]
    NoResults,

    /// The API rejected the request
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message returned by the API
        message: String,
    },

    /// Transport-level HTTP errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The remote object changed underneath the request
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation exceeded its configured timeout
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Operation or type not supported by a handler
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors (fixture files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error annotated with the step that produced it
    #[error("{message}: {source}")]
    Context {
        /// Human readable description of the failed step
        message: String,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a duplicate record error
    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }

    /// Create an API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an unsupported-operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Wrap an error with a description of the failed step
    pub fn context(message: impl Into<String>, source: Error) -> Self {
        Self::Context {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, skipping every [`Error::Context`] layer
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the root cause is a missing resource or record
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Error::NotFound(_))
    }

    /// True when the root cause is a duplicate record
    pub fn is_duplicate(&self) -> bool {
        matches!(self.root(), Error::Duplicate(_))
    }
}

/// Extension for attaching step descriptions to results
pub trait ResultExt<T> {
    /// Wrap the error (if any) with `message`
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::context(message, e))
    }
}
