//! Error types for synkbot
//!
//! Uses thiserror for ergonomic error definitions.
//! These errors can be converted to anyhow::Error in the main application.

use std::time::Duration;

/// synkctl invocation and response errors
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// synkctl exited non-zero; holds the first line of its stderr
    #[error("{0}")]
    CommandFailed(String),

    #[error("Failed to start '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("'{command}' did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("Malformed response from '{command}': {reason}")]
    MalformedResponse { command: String, reason: String },

    #[error("Missing field '{0}' in synkctl response")]
    MissingField(&'static str),

    #[error("Invalid value for field '{field}', expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Language model endpoint errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Request to language model failed: {0}")]
    Request(String),

    #[error("Language model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode language model response: {0}")]
    Decode(String),

    #[error("No final answer after {0} tool rounds")]
    TooManyToolRounds(usize),
}
