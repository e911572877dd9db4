//! cortex-core: quiz engine, session persistence and content search.
//!
//! This crate defines the content model, the selection and quiz state
//! machines, the resume/history persistence slots and the search index that
//! the `cortex` binary presents.

pub mod clock;
pub mod config;
pub mod content;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod model;
pub mod navigator;
pub mod persistence;
pub mod pool;
pub mod scheduler;
pub mod search;
pub mod session;

pub use engine::{EngineOptions, Notice, QuizEngine, QuizResult, TimerEvent};
pub use error::{ConfigError, ContentError, QuizError, StorageError};
