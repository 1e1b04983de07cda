//! Error types and handling for ebloc-bridge
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Boxed cause carried by errors that wrap a lower-level failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for ebloc-bridge operations
pub type Result<T> = std::result::Result<T, EblocError>;

/// Main error type for ebloc-bridge
#[derive(Debug, Error)]
pub enum EblocError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// The portal response cannot be trusted: transport failure, login
    /// redirect, undecodable body or an unrecognized payload shape
    #[error("Authentication error: {message}")]
    Auth {
        message: String,
        #[source]
        cause: Option<BoxError>,
    },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// A refresh cycle was aborted
    #[error("Update failed: {message}")]
    UpdateFailed {
        message: String,
        #[source]
        cause: Box<EblocError>,
    },

    /// HTTP/Web server errors
    #[error("Web server error: {message}")]
    Web { message: String },
}

impl EblocError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        EblocError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        EblocError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        EblocError::Io {
            message: message.into(),
        }
    }

    /// Create a new auth error without an underlying cause
    pub fn auth<S: Into<String>>(message: S) -> Self {
        EblocError::Auth {
            message: message.into(),
            cause: None,
        }
    }

    /// Create a new auth error that keeps the lower-level failure as its source
    pub fn auth_with_cause<S, E>(message: S, cause: E) -> Self
    where
        S: Into<String>,
        E: Into<BoxError>,
    {
        EblocError::Auth {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        EblocError::Timeout {
            message: message.into(),
        }
    }

    /// Wrap a cycle-level failure
    pub fn update_failed(cause: EblocError) -> Self {
        EblocError::UpdateFailed {
            message: cause.to_string(),
            cause: Box::new(cause),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        EblocError::Web {
            message: message.into(),
        }
    }

    /// Whether this error (or the failure it wraps) means the portal rejected
    /// or garbled the response
    pub fn is_auth(&self) -> bool {
        match self {
            EblocError::Auth { .. } => true,
            EblocError::UpdateFailed { cause, .. } => cause.is_auth(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for EblocError {
    fn from(err: std::io::Error) -> Self {
        EblocError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for EblocError {
    fn from(err: serde_yaml::Error) -> Self {
        EblocError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for EblocError {
    fn from(err: serde_json::Error) -> Self {
        EblocError::Serialization {
            message: err.to_string(),
        }
    }
}
