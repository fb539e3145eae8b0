//! Where raw configuration comes from.
//!
//! A [`ConfigSource`] is consulted at startup and again on every reload. A source
//! that cannot be read fails the whole load; what it returns is then validated
//! entry by entry.
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::raw::RawConfig;
use crate::error::{Error, Result};

pub trait ConfigSource: Send + Sync {
    /// Short description for logs, such as a file path.
    fn describe(&self) -> String;

    fn load(&self) -> Result<RawConfig>;
}

/// RON document on disk.
#[derive(Debug, Clone)]
pub struct RonFileSource {
    path: PathBuf,
}

impl RonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for RonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<RawConfig> {
        let text = fs::read_to_string(&self.path).map_err(|source| Error::ConfigUnavailable {
            path: self.path.clone(),
            source,
        })?;
        RawConfig::from_ron_str(&text)
    }
}

/// In-memory configuration, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    raw: RawConfig,
}

impl StaticSource {
    pub fn new(raw: RawConfig) -> Self {
        Self { raw }
    }

    /// Parses `text` up front so a bad document fails at construction.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(Self::new(RawConfig::from_ron_str(text)?))
    }
}

impl ConfigSource for StaticSource {
    fn describe(&self) -> String {
        "<static>".into()
    }

    fn load(&self) -> Result<RawConfig> {
        Ok(self.raw.clone())
    }
}
