//! Error types for the quiz engine, storage, content loading and configuration.
//!
//! Conditions the user can recover from (`NoQuestionsAvailable`,
//! `CorruptProgress`) are reported through these types after the engine has
//! already restored a safe state; nothing here is meant to abort the program.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::{Format, Region, Scope, System};
use crate::session::QuizState;

/// Errors reported by the quiz engine.
#[derive(Debug, Error)]
pub enum QuizError {
    /// The selected region/system/format has no questions.
    #[error("no questions available for {region} / {system} / {format}")]
    NoQuestionsAvailable {
        region: Scope<Region>,
        system: Scope<System>,
        format: Format,
    },

    /// The saved session could not be restored; the slot has been cleared.
    #[error("saved progress could not be restored: {0}")]
    CorruptProgress(String),

    /// A quiz was started before region and system were chosen.
    #[error("selection incomplete: choose a {0} first")]
    IncompleteSelection(&'static str),

    /// The requested operation is not legal in the current state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: QuizState,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures of the key-value store backing persistence.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while loading content files.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read content from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("content is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("content root must be an object")]
    NotAnObject,

    #[error("invalid question '{prompt}': {reason}")]
    InvalidQuestion { prompt: String, reason: String },
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
