//! Validation of a [`RawConfig`] into a [`WeightTable`] and [`ReplaceableSet`].
//!
//! Loading never fails. Every row-level problem becomes a [`LoadWarning`], is
//! logged, and the offending entry is skipped; levels and categories that end up
//! empty are dropped.
use thiserror::Error;
use tracing::warn;

use crate::config::raw::{RawConfig, RawKey, RawLevels, RawMaterials, RawSection, RawWeight};
use crate::material::MaterialRegistry;
use crate::table::{CategoryLevels, LevelWeights, ReplaceableSet, WeightTable};

/// A recoverable problem found while loading configuration.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadWarning {
    #[error("no generator levels are configured")]
    NoGeneratorLevels,

    #[error("category '{category}' is not a map of levels, skipping")]
    InvalidCategory { category: String },

    #[error("category '{category}' is defined more than once, keeping the last definition")]
    DuplicateCategory { category: String },

    #[error("skipping level key '{key}' in category '{category}', expected a number >= 1")]
    InvalidLevelKey { category: String, key: String },

    #[error("level {level} in category '{category}' is defined more than once, key '{key}' wins")]
    DuplicateLevel {
        category: String,
        level: u32,
        key: String,
    },

    #[error("level {level} in category '{category}' is not a map of materials, skipping")]
    InvalidLevel { category: String, level: u32 },

    #[error("unknown material '{name}' in {context}")]
    UnknownMaterial { context: String, name: String },

    #[error("invalid weight {value} for '{material}' in {context}")]
    InvalidWeight {
        context: String,
        material: String,
        value: String,
    },

    #[error("no valid materials in level {level} of category '{category}', dropping the level")]
    EmptyLevel { category: String, level: u32 },

    #[error("no valid levels in category '{category}', dropping the category")]
    EmptyCategory { category: String },

    #[error("negative spawn delay {value}, using 0")]
    NegativeSpawnDelay { value: i64 },

    #[error("invalid {field} {value}, using {fallback}")]
    InvalidSetting {
        field: &'static str,
        value: f64,
        fallback: f64,
    },
}

pub(crate) fn push_warning(warnings: &mut Vec<LoadWarning>, warning: LoadWarning) {
    warn!("{}", warning);
    warnings.push(warning);
}

/// Builds the weight table and replaceable set from `raw`.
pub fn load_tables(
    raw: &RawConfig,
    registry: &MaterialRegistry,
) -> (WeightTable, ReplaceableSet, Vec<LoadWarning>) {
    let mut warnings = Vec::new();
    let replaceable = load_replaceable(&raw.settings.replaceable_blocks, registry, &mut warnings);

    let mut table = WeightTable::new();
    if raw.generator_levels.is_empty() {
        push_warning(&mut warnings, LoadWarning::NoGeneratorLevels);
    }

    for (category_key, section) in &raw.generator_levels {
        let category = category_key.trim().to_ascii_lowercase();
        let RawSection::Section(levels) = section else {
            push_warning(
                &mut warnings,
                LoadWarning::InvalidCategory {
                    category: category_key.clone(),
                },
            );
            continue;
        };

        let levels = load_category(&category, levels, registry, &mut warnings);
        if levels.is_empty() {
            push_warning(&mut warnings, LoadWarning::EmptyCategory { category });
            continue;
        }
        if table.category(&category).is_some() {
            push_warning(
                &mut warnings,
                LoadWarning::DuplicateCategory {
                    category: category.clone(),
                },
            );
        }
        table.insert_category(&category, levels);
    }

    (table, replaceable, warnings)
}

fn load_replaceable(
    names: &[String],
    registry: &MaterialRegistry,
    warnings: &mut Vec<LoadWarning>,
) -> ReplaceableSet {
    names
        .iter()
        .filter_map(|name| {
            let material = registry.resolve(name);
            if material.is_none() {
                push_warning(
                    warnings,
                    LoadWarning::UnknownMaterial {
                        context: "settings.replaceable_blocks".into(),
                        name: name.clone(),
                    },
                );
            }
            material
        })
        .collect()
}

fn load_category(
    category: &str,
    levels: &RawLevels,
    registry: &MaterialRegistry,
    warnings: &mut Vec<LoadWarning>,
) -> CategoryLevels {
    let mut out = CategoryLevels::new();
    for (key, section) in levels {
        let Some(level) = parse_level_key(key) else {
            push_warning(
                warnings,
                LoadWarning::InvalidLevelKey {
                    category: category.to_owned(),
                    key: key.to_string(),
                },
            );
            continue;
        };
        let RawSection::Section(materials) = section else {
            push_warning(
                warnings,
                LoadWarning::InvalidLevel {
                    category: category.to_owned(),
                    level,
                },
            );
            continue;
        };

        let weights = load_level(category, level, materials, registry, warnings);
        if weights.is_empty() {
            push_warning(
                warnings,
                LoadWarning::EmptyLevel {
                    category: category.to_owned(),
                    level,
                },
            );
            continue;
        }
        tracing::debug!(
            "Loaded {} materials for '{}' level {}.",
            weights.len(),
            category,
            level
        );
        if out.insert(level, weights).is_some() {
            push_warning(
                warnings,
                LoadWarning::DuplicateLevel {
                    category: category.to_owned(),
                    level,
                    key: key.to_string(),
                },
            );
        }
    }
    out
}

fn load_level(
    category: &str,
    level: u32,
    materials: &RawMaterials,
    registry: &MaterialRegistry,
    warnings: &mut Vec<LoadWarning>,
) -> LevelWeights {
    let context = || format!("'{category}' level {level}");
    let mut weights = LevelWeights::new();
    for (name, raw_weight) in materials {
        let Some(material) = registry.resolve(name) else {
            push_warning(
                warnings,
                LoadWarning::UnknownMaterial {
                    context: context(),
                    name: name.clone(),
                },
            );
            continue;
        };
        let Some(weight) = parse_weight(raw_weight) else {
            push_warning(
                warnings,
                LoadWarning::InvalidWeight {
                    context: context(),
                    material: name.clone(),
                    value: raw_weight.to_string(),
                },
            );
            continue;
        };
        weights.insert(material, weight);
    }
    weights
}

/// Levels are positive integers written with ASCII digits only.
fn parse_level_key(key: &RawKey) -> Option<u32> {
    let level = match key {
        RawKey::Int(v) => u32::try_from(*v).ok()?,
        RawKey::Text(text) => {
            let text = text.trim();
            if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            text.parse::<u32>().ok()?
        }
    };
    (level >= 1).then_some(level)
}

/// Weights are finite and non-negative; numeric strings are accepted.
fn parse_weight(raw: &RawWeight) -> Option<f64> {
    let value = match raw {
        RawWeight::Number(v) => *v,
        RawWeight::Text(text) => text.trim().parse::<f64>().ok()?,
        RawWeight::Invalid(_) => return None,
    };
    (value.is_finite() && value >= 0.0).then_some(value)
}
