//! Shared error types for samplers, checkers and the orchestration primitives

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("HTTP request to {url} failed: {source}")]
    HttpError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unsuccessful response from {url}: {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Invalid content identifier: {input}")]
    InvalidIdentifier { input: String },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Failed to decode response from {url}: {message}")]
    DecodeError { url: String, message: String },

    #[error("Operation cancelled")]
    Cancelled,
}

impl SharedError {
    /// Shorthand for a configuration field that failed validation
    pub fn invalid_config(field: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

pub type SharedResult<T> = Result<T, SharedError>;
