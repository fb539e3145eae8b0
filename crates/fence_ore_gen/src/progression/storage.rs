//! Player-level persistence.
//!
//! The canonical file is a RON document `(levels: { "<uuid>": <level> })`. Writes
//! go to a sibling temporary file that is renamed over the original.
//!
//! Two older YAML layouts can be merged once: `levels.yml` holds top-level
//! `<uuid>: <level>` pairs, `players.yml` nests the same pairs under `levels:`.
//! Records the store does not know yet are adopted, the store is saved, and each
//! old file is renamed to `<stem>_backup.<ext>` so it is never read again.
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::progression::ProgressionStore;

pub const PLAYER_DATA_FILE: &str = "playerdata.ron";
pub const LEGACY_PLAYERS_FILE: &str = "players.yml";
pub const LEGACY_LEVELS_FILE: &str = "levels.yml";

/// Section of `players.yml` that holds level records.
const LEGACY_LEVELS_SECTION: &str = "levels";

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredLevel {
    Level(u32),
    Invalid(IgnoredAny),
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PlayerDataIn {
    levels: BTreeMap<String, StoredLevel>,
}

#[derive(Serialize)]
struct PlayerDataOut {
    levels: BTreeMap<String, u32>,
}

/// What merging one legacy file did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub source: PathBuf,
    /// Records adopted into the store.
    pub migrated: usize,
    /// Well-formed records ignored because the store already had that player.
    pub kept_existing: usize,
    /// Malformed records.
    pub skipped: usize,
    /// Where the legacy file now lives.
    pub backup: PathBuf,
}

/// Location of the player-data file and of legacy files to merge, in merge order.
#[derive(Debug, Clone)]
pub struct PlayerDataFile {
    path: PathBuf,
    legacy: Vec<PathBuf>,
}

impl PlayerDataFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            legacy: Vec::new(),
        }
    }

    /// Standard file names inside `dir`, with both legacy files enabled.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(PLAYER_DATA_FILE))
            .with_legacy(dir.join(LEGACY_PLAYERS_FILE))
            .with_legacy(dir.join(LEGACY_LEVELS_FILE))
    }

    /// Adds a legacy file. Earlier files win when two of them name the same player.
    pub fn with_legacy(mut self, path: impl Into<PathBuf>) -> Self {
        self.legacy.push(path.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the canonical file. A missing file is an empty store; malformed
    /// entries are skipped with a warning.
    pub fn load(&self) -> Result<ProgressionStore> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("No player data at {}, starting empty.", self.path.display());
                return Ok(ProgressionStore::new());
            }
            Err(err) => return Err(err.into()),
        };
        let doc: PlayerDataIn = ron::from_str(&text).map_err(|err| Error::PlayerData {
            path: self.path.clone(),
            message: err.to_string(),
        })?;

        let mut store = ProgressionStore::new();
        for (key, value) in doc.levels {
            let parsed = Uuid::parse_str(key.trim()).ok();
            match (parsed, value) {
                (Some(id), StoredLevel::Level(level)) if level >= 1 => store.set_level(id, level),
                _ => warn!(
                    "Skipping malformed player record '{}' in {}.",
                    key,
                    self.path.display()
                ),
            }
        }
        info!("Loaded {} player levels.", store.len());
        Ok(store)
    }

    /// Writes `store` to the canonical file.
    pub fn save(&self, store: &ProgressionStore) -> Result<()> {
        let doc = PlayerDataOut {
            levels: store
                .iter()
                .map(|(id, level)| (id.to_string(), level))
                .collect(),
        };
        let text = ron::ser::to_string_pretty(&doc, ron::ser::PrettyConfig::default())?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = tmp_path(&self.path);
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!("Saved {} player levels to {}.", store.len(), self.path.display());
        Ok(())
    }

    /// Loads the store, then merges any legacy files that exist.
    pub fn load_and_migrate(&self) -> Result<ProgressionStore> {
        let mut store = self.load()?;
        self.migrate_legacy(&mut store);
        Ok(store)
    }

    /// Merges every legacy file into `store`. A file that fails is logged and left
    /// in place for the next start; the others still migrate.
    pub fn migrate_legacy(&self, store: &mut ProgressionStore) -> Vec<Migration> {
        let mut done = Vec::new();
        for legacy in &self.legacy {
            match self.migrate_file(legacy, store) {
                Ok(Some(migration)) => done.push(migration),
                Ok(None) => {}
                Err(err) => warn!(
                    "Legacy player data in {} could not be migrated: {}",
                    legacy.display(),
                    err
                ),
            }
        }
        done
    }

    /// Merges one legacy file into `store`. Returns `Ok(None)` when it does not exist.
    pub fn migrate_file(
        &self,
        legacy: &Path,
        store: &mut ProgressionStore,
    ) -> Result<Option<Migration>> {
        let text = match fs::read_to_string(legacy) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let mut migrated = 0;
        let mut kept_existing = 0;
        let mut skipped = 0;
        let mut section: Option<&str> = None;
        for (line_no, raw) in text.lines().enumerate() {
            let line = strip_comment(raw).trim_end();
            let record = line.trim_start();
            if record.is_empty() || record == "---" {
                continue;
            }
            if record.len() == line.len() {
                if let Some(key) = record.strip_suffix(':') {
                    section = Some(key.trim());
                    continue;
                }
                section = None;
            } else if section != Some(LEGACY_LEVELS_SECTION) {
                continue;
            }

            let Some((id, level)) = parse_legacy_record(record) else {
                warn!(
                    "Skipping malformed legacy record on line {} of {}: '{}'.",
                    line_no + 1,
                    legacy.display(),
                    record
                );
                skipped += 1;
                continue;
            };
            if store.contains(id) {
                kept_existing += 1;
            } else {
                store.set_level(id, level);
                migrated += 1;
            }
        }

        self.save(store)?;
        let backup = backup_path(legacy);
        fs::rename(legacy, &backup)?;
        info!(
            "Migrated {} legacy player levels ({} already known, {} malformed); backup at {}.",
            migrated,
            kept_existing,
            skipped,
            backup.display()
        );
        Ok(Some(Migration {
            source: legacy.to_path_buf(),
            migrated,
            kept_existing,
            skipped,
            backup,
        }))
    }
}

fn parse_legacy_record(line: &str) -> Option<(Uuid, u32)> {
    let (key, value) = line.split_once(':')?;
    let unquote: fn(&str) -> &str = |text| text.trim().trim_matches(|c| c == '"' || c == '\'');
    let id = Uuid::parse_str(unquote(key)).ok()?;
    let level = unquote(value).parse::<u32>().ok().filter(|level| *level >= 1)?;
    Some((id, level))
}

/// Cuts a YAML comment: `#` at the start of the line or after whitespace.
fn strip_comment(line: &str) -> &str {
    let mut after_space = true;
    for (i, c) in line.char_indices() {
        if c == '#' && after_space {
            return &line[..i];
        }
        after_space = c.is_whitespace();
    }
    line
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// `levels.yml` becomes `levels_backup.yml`.
fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_backup.{}", ext.to_string_lossy()),
        None => format!("{stem}_backup"),
    };
    path.with_file_name(name)
}
