//! Error types and handling for Heliodash
//!
//! This module defines the error types used throughout the application,
//! including the dongle status-code mapping used by the poll loop.

use thiserror::Error;

/// Result type alias for Heliodash operations
pub type Result<T> = std::result::Result<T, HelioError>;

/// Main error type for Heliodash
#[derive(Debug, Error)]
pub enum HelioError {
    /// Transport to the dongle was never established
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Dongle answered with a non-success HTTP status
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Response body is not the expected JSON structure
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Register array present but malformed (too short, out-of-range values)
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// A decision was requested before the sample window filled up
    #[error("Stale history: {filled} of {capacity} samples collected")]
    StaleHistory { filled: usize, capacity: usize },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Network-related errors outside the dongle protocol (exchange rates)
    #[error("Network error: {message}")]
    Network { message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Dongle discovery failed
    #[error("Discovery error: {message}")]
    Discovery { message: String },
}

impl HelioError {
    /// Create a new connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        HelioError::Connection {
            message: message.into(),
        }
    }

    /// Create a new HTTP status error
    pub fn http(status: u16) -> Self {
        HelioError::Http { status }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        HelioError::Protocol {
            message: message.into(),
        }
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(message: S) -> Self {
        HelioError::Decode {
            message: message.into(),
        }
    }

    /// Create a new stale-history error
    pub fn stale_history(filled: usize, capacity: usize) -> Self {
        HelioError::StaleHistory { filled, capacity }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        HelioError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        HelioError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        HelioError::Io {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        HelioError::Network {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        HelioError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new discovery error
    pub fn discovery<S: Into<String>>(message: S) -> Self {
        HelioError::Discovery {
            message: message.into(),
        }
    }

    /// Dongle status code for this error.
    ///
    /// `-1` transport failure, `-2` non-OK HTTP status, `-3` anything wrong
    /// with the body (JSON, structure, register array). Errors that never come
    /// out of a dongle poll report `-1` when they are transport-like and `-3`
    /// otherwise.
    pub fn status_code(&self) -> i32 {
        match self {
            HelioError::Connection { .. }
            | HelioError::Timeout { .. }
            | HelioError::Network { .. }
            | HelioError::Io { .. }
            | HelioError::Discovery { .. } => -1,
            HelioError::Http { .. } => -2,
            _ => -3,
        }
    }

    /// Whether the error is about the response content rather than the transport
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            HelioError::Protocol { .. } | HelioError::Decode { .. } | HelioError::Http { .. }
        )
    }
}

impl From<std::io::Error> for HelioError {
    fn from(err: std::io::Error) -> Self {
        HelioError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for HelioError {
    fn from(err: serde_yaml::Error) -> Self {
        HelioError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for HelioError {
    fn from(err: serde_json::Error) -> Self {
        HelioError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for HelioError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HelioError::timeout(err.to_string())
        } else if let Some(status) = err.status() {
            HelioError::http(status.as_u16())
        } else if err.is_decode() {
            HelioError::protocol(err.to_string())
        } else {
            HelioError::network(err.to_string())
        }
    }
}

impl From<chrono::ParseError> for HelioError {
    fn from(err: chrono::ParseError) -> Self {
        HelioError::validation("datetime", err.to_string().as_str())
    }
}
