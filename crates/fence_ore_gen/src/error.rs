//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Only
//! failures that abort an operation live here: an unreadable configuration source, a
//! document that does not parse, player data that cannot be read or written, and IO.
//! Row-level configuration problems are reported as
//! [`crate::config::LoadWarning`]s instead, and user-facing command failures as
//! [`crate::commands::CommandError`].
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration source '{path}' is unavailable: {source}")]
    ConfigUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration document could not be parsed: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    #[error("player data could not be serialized: {0}")]
    Serialize(#[from] ron::Error),

    #[error("player data at '{path}' is invalid: {message}")]
    PlayerData { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
