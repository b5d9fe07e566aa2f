//! Layered error definitions
//!
//! Categorized by source: discovery / io / protocol / config / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum BridgeError {
    // ===== Discovery Errors =====
    /// No matching serial device found
    #[error("device discovery failed: {message}")]
    Discovery { message: String },

    // ===== Protocol Errors =====
    /// Device rejected a handshake command
    #[error("device rejected command `{command}`: {response}")]
    Protocol { command: String, response: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// No sink survived activation
    #[error("no active outputters are available")]
    NoActiveSinks,

    // ===== Sink Errors =====
    /// Sink initialization or delivery error
    #[error("sink '{name}': {message}")]
    Sink { name: String, message: String },

    // ===== General Errors =====
    /// IO error (serial read/write, sink transport)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl BridgeError {
    /// Create a discovery error
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
        }
    }

    /// Create a protocol error for a rejected handshake command
    pub fn protocol(command: impl Into<String>, response: impl Into<String>) -> Self {
        Self::Protocol {
            command: command.into(),
            response: response.into(),
        }
    }

    /// Create a configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a sink error
    pub fn sink(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sink {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a read-timeout IO error
    pub fn read_timeout() -> Self {
        Self::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "read timed out",
        ))
    }
}
