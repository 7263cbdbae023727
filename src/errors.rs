// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Process and timer failures are represented here so they can be logged with
//! a consistent message, but they are never returned to callers: a
//! [`ProcessTask`](crate::exec::ProcessTask) always completes, and a cancelled
//! timer is an expected outcome.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpoolrError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The external process could not be started.
    #[error("failed to spawn '{invocation}': {source}")]
    SpawnFailure {
        invocation: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the process's standard output failed part way through.
    #[error("failed to read output of '{invocation}': {source}")]
    StreamReadFailure {
        invocation: String,
        #[source]
        source: std::io::Error,
    },

    /// Soft deadline reached; the process was left running.
    #[error("'{invocation}' did not finish within {timeout:?}; reporting partial output")]
    TimeoutExceeded {
        invocation: String,
        timeout: Duration,
    },

    #[error("timer '{0}' cancelled before firing")]
    TimerCanceled(&'static str),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SpoolrError>;
