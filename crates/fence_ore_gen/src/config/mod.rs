//! Generator configuration: loading, validation, and atomic publication.
//!
//! A [`GeneratorConfig`] is an immutable snapshot. [`ConfigHandle`] holds the
//! current snapshot behind one swappable reference; a reload builds a complete new
//! snapshot first and only then publishes it, so readers see either the old state
//! or the new one, never a mix. A failed reload leaves the old snapshot in place.
use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::error::Result;
use crate::material::MaterialRegistry;
use crate::progression::UpgradePricing;
use crate::table::{ReplaceableSet, WeightTable};

pub mod loader;
pub mod raw;
pub mod source;

pub use loader::{load_tables, LoadWarning};
pub use raw::{RawConfig, RawKey, RawSection, RawSettings, RawWeight};
pub use source::{ConfigSource, RonFileSource, StaticSource};

use loader::push_warning;

pub const DEFAULT_MAX_PLAYER_DISTANCE: f64 = 5.0;

/// Immutable generator state.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub table: WeightTable,
    pub replaceable: ReplaceableSet,
    /// Ticks between a trigger and the block change; 0 runs it immediately.
    pub spawn_delay: u64,
    pub pricing: UpgradePricing,
    /// When `false`, triggers are ignored.
    pub enabled: bool,
    pub disabled_worlds: HashSet<String>,
    /// Radius within which the nearest player lends their level to water-flow triggers.
    pub max_player_distance: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(WeightTable::new(), ReplaceableSet::new())
    }
}

impl GeneratorConfig {
    pub fn new(table: WeightTable, replaceable: ReplaceableSet) -> Self {
        Self {
            table,
            replaceable,
            spawn_delay: 0,
            pricing: UpgradePricing::default(),
            enabled: true,
            disabled_worlds: HashSet::new(),
            max_player_distance: DEFAULT_MAX_PLAYER_DISTANCE,
        }
    }

    pub fn with_spawn_delay(mut self, ticks: u64) -> Self {
        self.spawn_delay = ticks;
        self
    }

    pub fn with_pricing(mut self, pricing: UpgradePricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_disabled_world(mut self, name: impl Into<String>) -> Self {
        self.disabled_worlds.insert(name.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_max_player_distance(mut self, distance: f64) -> Self {
        self.max_player_distance = distance;
        self
    }

    /// Validates `raw` into a snapshot. Never fails; see [`LoadReport::warnings`].
    pub fn from_raw(raw: &RawConfig, registry: &MaterialRegistry) -> LoadReport {
        let (table, replaceable, mut warnings) = load_tables(raw, registry);

        let spawn_delay = u64::try_from(raw.spawn_delay).unwrap_or_else(|_| {
            push_warning(
                &mut warnings,
                LoadWarning::NegativeSpawnDelay {
                    value: raw.spawn_delay,
                },
            );
            0
        });

        let defaults = RawSettings::default();
        let settings = &raw.settings;
        let base = checked_setting(
            "upgrade_cost",
            settings.upgrade_cost,
            defaults.upgrade_cost,
            &mut warnings,
        )
        .max(0.0);
        let multiplier = checked_setting(
            "upgrade_cost_multiplier",
            settings.upgrade_cost_multiplier,
            defaults.upgrade_cost_multiplier,
            &mut warnings,
        )
        .max(1.0);
        let mut max_player_distance = checked_setting(
            "max_player_distance",
            settings.max_player_distance,
            defaults.max_player_distance,
            &mut warnings,
        );
        if max_player_distance < 0.0 {
            push_warning(
                &mut warnings,
                LoadWarning::InvalidSetting {
                    field: "max_player_distance",
                    value: max_player_distance,
                    fallback: DEFAULT_MAX_PLAYER_DISTANCE,
                },
            );
            max_player_distance = DEFAULT_MAX_PLAYER_DISTANCE;
        }

        let config = GeneratorConfig {
            table,
            replaceable,
            spawn_delay,
            pricing: UpgradePricing::new(base, multiplier),
            enabled: settings.enabled,
            disabled_worlds: settings.disabled_worlds.iter().cloned().collect(),
            max_player_distance,
        };
        LoadReport { config, warnings }
    }

    pub fn is_world_disabled(&self, world_name: &str) -> bool {
        self.disabled_worlds.contains(world_name)
    }

    /// Highest level configured for `category`, 1 if absent.
    pub fn max_level(&self, category: &str) -> u32 {
        self.table.max_level(category)
    }
}

fn checked_setting(
    field: &'static str,
    value: f64,
    fallback: f64,
    warnings: &mut Vec<LoadWarning>,
) -> f64 {
    if value.is_finite() {
        return value;
    }
    push_warning(
        warnings,
        LoadWarning::InvalidSetting {
            field,
            value,
            fallback,
        },
    );
    fallback
}

/// Outcome of building a snapshot from raw configuration.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub config: GeneratorConfig,
    pub warnings: Vec<LoadWarning>,
}

/// Shared, atomically swappable reference to the current [`GeneratorConfig`].
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    current: Arc<RwLock<Arc<GeneratorConfig>>>,
}

impl ConfigHandle {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Loads the initial snapshot from `source`. Fails if the source is unreadable.
    pub fn load(
        source: &dyn ConfigSource,
        registry: &MaterialRegistry,
    ) -> Result<(Self, Vec<LoadWarning>)> {
        let report = GeneratorConfig::from_raw(&source.load()?, registry);
        info!(
            "Loaded generator configuration from {} (categories {:?}, {} warnings).",
            source.describe(),
            report.config.table.categories(),
            report.warnings.len()
        );
        Ok((Self::new(report.config), report.warnings))
    }

    /// The snapshot in effect right now. Holding it keeps that state alive even
    /// across later reloads.
    pub fn snapshot(&self) -> Arc<GeneratorConfig> {
        Arc::clone(&self.current.read())
    }

    /// Replaces the current snapshot, returning the previous one.
    pub fn publish(&self, config: GeneratorConfig) -> Arc<GeneratorConfig> {
        let next = Arc::new(config);
        std::mem::replace(&mut *self.current.write(), next)
    }

    /// Rebuilds the snapshot from `source` and publishes it. On error nothing changes.
    pub fn reload(
        &self,
        source: &dyn ConfigSource,
        registry: &MaterialRegistry,
    ) -> Result<Vec<LoadWarning>> {
        let raw = source.load()?;
        let report = GeneratorConfig::from_raw(&raw, registry);
        info!(
            "Reloaded generator configuration from {} (categories {:?}, {} warnings).",
            source.describe(),
            report.config.table.categories(),
            report.warnings.len()
        );
        self.publish(report.config);
        Ok(report.warnings)
    }
}
