use garden_sim::SimError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from a device session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Connection failed: {reason}")]
    Connection { port: String, reason: String },

    #[error("already connected to {0}")]
    AlreadyConnected(String),

    #[error("not connected")]
    NotConnected,

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("failed to start {name} thread: {source}")]
    Thread {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Errors loading or validating runner configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Garden(#[from] SimError),
}

/// A console line that is not a valid command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("{command} needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("'{0}' is not a number")]
    InvalidNumber(String),
}
