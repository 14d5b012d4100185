//! Error types for node_input_recorder

use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Configuration error in {file}: {message}")]
    Config { file: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Namespace of node '{node}' is empty. Use '/' for the root namespace.")]
    EmptyNamespace { node: String },

    #[error("Node '{0}' not found. Make sure it is running and discoverable.")]
    NodeNotFound(String),

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Output of '{command}' is not valid UTF-8")]
    NonUtf8Output { command: String },

    #[error("Session directory already exists: {0}")]
    SessionExists(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RecorderError {
    pub(crate) fn config(file: impl Into<String>, message: impl std::fmt::Display) -> Self {
        RecorderError::Config {
            file: file.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RecorderError>;
