use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Failure to bring the calendar backend up. Fatal for the session.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Backend command is empty")]
    EmptyCommand,

    #[error("Backend working directory not found: {}", .0.display())]
    MissingWorkingDir(PathBuf),

    #[error("Failed to launch backend `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Backend exited during startup ({0})")]
    ExitedEarly(ExitStatus),

    #[error("Backend did not become ready within {0} seconds")]
    NotReady(u64),
}

/// Coarse classification of a [`GatewayError`], for callers that branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    Timeout,
    ConnectionRefused,
    Status,
    MalformedResponse,
    Unknown,
}

/// Failure talking to the inference endpoint.
///
/// The `Display` text is what the user sees; the session keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Request to AI model timed out. Please try again.")]
    Timeout,

    #[error("Could not connect to AI model. Is Ollama running?")]
    ConnectionRefused,

    #[error("Error communicating with Ollama: {0}")]
    Status(u16),

    #[error("Received invalid response from AI model.")]
    MalformedResponse,

    #[error("Error: {0}")]
    Unknown(String),
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            GatewayError::Timeout => GatewayErrorKind::Timeout,
            GatewayError::ConnectionRefused => GatewayErrorKind::ConnectionRefused,
            GatewayError::Status(_) => GatewayErrorKind::Status,
            GatewayError::MalformedResponse => GatewayErrorKind::MalformedResponse,
            GatewayError::Unknown(_) => GatewayErrorKind::Unknown,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_connect() {
            GatewayError::ConnectionRefused
        } else if err.is_decode() {
            GatewayError::MalformedResponse
        } else {
            GatewayError::Unknown(err.to_string())
        }
    }
}

/// A fenced block that could not be read as a tool call
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("tool call is not a JSON object")]
    NotAnObject,

    #[error("tool call is missing `{0}`")]
    MissingField(&'static str),

    #[error("tool call field `{0}` has the wrong type")]
    InvalidField(&'static str),
}

/// A tool call that could not be carried out
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Error executing {tool}: {message}")]
    Backend { tool: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_messages() {
        assert_eq!(
            GatewayError::Timeout.to_string(),
            "Request to AI model timed out. Please try again."
        );
        assert_eq!(
            GatewayError::Status(500).to_string(),
            "Error communicating with Ollama: 500"
        );
        assert_eq!(GatewayError::Unknown("boom".into()).to_string(), "Error: boom");
        assert_eq!(GatewayError::Status(404).kind(), GatewayErrorKind::Status);
    }

    #[test]
    fn test_unknown_tool_message() {
        assert_eq!(
            DispatchError::UnknownTool("frobnicate".into()).to_string(),
            "Unknown tool: frobnicate"
        );
    }
}
