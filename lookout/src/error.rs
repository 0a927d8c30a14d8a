//! Lookout-specific error types

use shared::SharedError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookoutError {
    #[error("Configuration error: {field}: {message}")]
    ConfigurationError { field: String, message: String },

    #[error("Failed to read configuration file {path}")]
    ConfigReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid listen address: {value}")]
    AddrParseError {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("Metrics server error: {message}")]
    ServerError { message: String },

    #[error("Pipeline task failed: {message}")]
    TaskError { message: String },

    #[error("Shared component error")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LookoutError {
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type LookoutResult<T> = Result<T, LookoutError>;
