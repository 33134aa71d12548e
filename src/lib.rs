//! Prefedit - a typed preference-file editing library.
//!
//! This library provides the core functionality for the `pfe` CLI tool:
//! the XML map codec, the preference store, and the privileged save
//! protocol used to replace files owned by other processes.

pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod models;
pub mod privileged;

/// Library-level error type for prefedit operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] codec::DecodeError),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("save failed: {}", .0.display())]
    SaveFailed(std::path::PathBuf),
}

/// Result type alias for prefedit operations.
pub type Result<T> = std::result::Result<T, Error>;
