//! Error types and handling for amberwatch
//!
//! This module defines the error types used throughout the application.
//! Only fetch-level failures ever reach a caller as errors; per-interval
//! parse problems are logged and dropped, and an empty tariff direction is
//! represented as an absent value rather than an error.

use thiserror::Error;

/// Result type alias for amberwatch operations
pub type Result<T> = std::result::Result<T, AmberError>;

/// Main error type for amberwatch
#[derive(Debug, Error)]
pub enum AmberError {
    /// Transport failure: non-2xx status, timeout, or an unreadable body
    #[error("Connectivity error: {source}")]
    Connectivity {
        #[source]
        source: reqwest::Error,
    },

    /// A single record or timestamp could not be parsed
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// The API answered but did not recognise the location
    #[error("Invalid postcode: {postcode}")]
    InvalidPostcode { postcode: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// HTTP server errors
    #[error("Web server error: {message}")]
    Web { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl AmberError {
    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new invalid postcode error
    pub fn invalid_postcode<S: Into<String>>(postcode: S) -> Self {
        Self::InvalidPostcode {
            postcode: postcode.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        Self::Web {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Whether this error came from talking to the price API
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}

impl From<reqwest::Error> for AmberError {
    fn from(source: reqwest::Error) -> Self {
        Self::Connectivity { source }
    }
}

impl From<std::io::Error> for AmberError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for AmberError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AmberError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<chrono::ParseError> for AmberError {
    fn from(err: chrono::ParseError) -> Self {
        Self::parse(err.to_string())
    }
}
