//! Per-player levels and upgrade pricing.
//!
//! Levels start at 1. The highest level reachable in a category is not stored
//! anywhere: it is read from the weight table currently loaded, so bounds follow
//! every reload.
use std::collections::HashMap;

use uuid::Uuid;

use crate::config::GeneratorConfig;

pub mod storage;

pub use storage::PlayerDataFile;

/// Level of every player the store has not seen.
pub const DEFAULT_LEVEL: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressionStore {
    levels: HashMap<Uuid, u32>,
}

impl ProgressionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level of `id`, [`DEFAULT_LEVEL`] if unknown.
    pub fn get_level(&self, id: Uuid) -> u32 {
        self.levels.get(&id).copied().unwrap_or(DEFAULT_LEVEL)
    }

    /// Overwrites the level of `id`. Bounds are the caller's concern.
    pub fn set_level(&mut self, id: Uuid, level: u32) {
        self.levels.insert(id, level);
    }

    /// Records `id` at [`DEFAULT_LEVEL`] if it has no level yet. Returns `true` if
    /// the player was new.
    pub fn ensure_player(&mut self, id: Uuid) -> bool {
        if self.levels.contains_key(&id) {
            return false;
        }
        self.levels.insert(id, DEFAULT_LEVEL);
        true
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.levels.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Uuid, u32)> + '_ {
        self.levels.iter().map(|(id, level)| (*id, *level))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl FromIterator<(Uuid, u32)> for ProgressionStore {
    fn from_iter<T: IntoIterator<Item = (Uuid, u32)>>(iter: T) -> Self {
        Self {
            levels: iter.into_iter().collect(),
        }
    }
}

/// Geometric upgrade pricing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpgradePricing {
    pub base: f64,
    pub multiplier: f64,
}

impl Default for UpgradePricing {
    fn default() -> Self {
        Self::new(1000.0, 1.5)
    }
}

impl UpgradePricing {
    pub fn new(base: f64, multiplier: f64) -> Self {
        Self { base, multiplier }
    }

    /// Price of reaching `next_level` from the level below it.
    ///
    /// `base * multiplier^(next_level - 2)`, rounded to cents. Reaching level 1 or
    /// below is free.
    pub fn cost(&self, next_level: u32) -> f64 {
        if next_level <= 1 {
            return 0.0;
        }
        let exponent = i32::try_from(next_level - 2).unwrap_or(i32::MAX);
        let raw = self.base * self.multiplier.powi(exponent);
        (raw * 100.0).round() / 100.0
    }
}

/// Highest level configured for `category` in `config`.
pub fn max_level(config: &GeneratorConfig, category: &str) -> u32 {
    config.max_level(category)
}
