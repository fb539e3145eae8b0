//! Raw configuration document as read from disk, before validation.
//!
//! Every section tolerates malformed content: a level that is not a map, or a weight
//! that is neither a number nor a string, deserializes into an `Invalid` variant so
//! the loader can warn about that single entry instead of rejecting the document.
use std::collections::BTreeMap;
use std::fmt;

use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::error::Result;

/// Map key written either as an integer (`1: {...}`) or a string (`"1": {...}`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(untagged)]
pub enum RawKey {
    Int(i64),
    Text(String),
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawKey::Int(v) => write!(f, "{v}"),
            RawKey::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for RawKey {
    fn from(value: &str) -> Self {
        RawKey::Text(value.to_owned())
    }
}

impl From<i64> for RawKey {
    fn from(value: i64) -> Self {
        RawKey::Int(value)
    }
}

impl From<i32> for RawKey {
    fn from(value: i32) -> Self {
        RawKey::Int(value.into())
    }
}

impl From<u32> for RawKey {
    fn from(value: u32) -> Self {
        RawKey::Int(value.into())
    }
}

/// A weight as written in the document.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawWeight {
    Number(f64),
    Text(String),
    Invalid(IgnoredAny),
}

impl fmt::Display for RawWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawWeight::Number(v) => write!(f, "{v}"),
            RawWeight::Text(v) => write!(f, "\"{v}\""),
            RawWeight::Invalid(_) => f.write_str("<non-numeric value>"),
        }
    }
}

/// A nested section that may turn out not to be a map.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawSection<T> {
    Section(T),
    Invalid(IgnoredAny),
}

pub type RawMaterials = BTreeMap<String, RawWeight>;
pub type RawLevels = BTreeMap<RawKey, RawSection<RawMaterials>>;
pub type RawCategories = BTreeMap<String, RawSection<RawLevels>>;

/// `settings` section.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawSettings {
    pub enabled: bool,
    pub replaceable_blocks: Vec<String>,
    pub upgrade_cost: f64,
    pub upgrade_cost_multiplier: f64,
    pub disabled_worlds: Vec<String>,
    pub max_player_distance: f64,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            replaceable_blocks: Vec::new(),
            upgrade_cost: 1000.0,
            upgrade_cost_multiplier: 1.5,
            disabled_worlds: Vec::new(),
            max_player_distance: 5.0,
        }
    }
}

/// Whole configuration document.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// Delay in ticks between a trigger and the block change.
    pub spawn_delay: i64,
    pub settings: RawSettings,
    pub generator_levels: RawCategories,
}

impl RawConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a RON document.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Sets one material weight, creating the category and level as needed.
    pub fn with_weight(
        mut self,
        category: &str,
        level: impl Into<RawKey>,
        material: &str,
        weight: RawWeight,
    ) -> Self {
        let levels = self
            .generator_levels
            .entry(category.to_owned())
            .or_insert_with(|| RawSection::Section(RawLevels::new()));
        if matches!(levels, RawSection::Invalid(_)) {
            *levels = RawSection::Section(RawLevels::new());
        }
        if let RawSection::Section(levels) = levels {
            let materials = levels
                .entry(level.into())
                .or_insert_with(|| RawSection::Section(RawMaterials::new()));
            if matches!(materials, RawSection::Invalid(_)) {
                *materials = RawSection::Section(RawMaterials::new());
            }
            if let RawSection::Section(materials) = materials {
                materials.insert(material.to_owned(), weight);
            }
        }
        self
    }

    pub fn with_replaceable(mut self, material: &str) -> Self {
        self.settings.replaceable_blocks.push(material.to_owned());
        self
    }

    pub fn with_spawn_delay(mut self, ticks: i64) -> Self {
        self.spawn_delay = ticks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
(
    spawn_delay: 20,
    settings: (
        replaceable_blocks: ["air", "water"],
        upgrade_cost: 250.0,
    ),
    generator_levels: {
        "overworld": {
            1: { "stone": 80, "coal_ore": "20" },
            "2": { "iron_ore": 5.5, "gold_ore": [1, 2] },
            "broken": 7,
        },
        "nether": "not a map",
    },
)
"#;

    #[test]
    fn parses_mixed_keys_and_tolerates_bad_entries() {
        let raw = RawConfig::from_ron_str(DOC).unwrap();
        assert_eq!(raw.spawn_delay, 20);
        assert_eq!(raw.settings.replaceable_blocks, vec!["air", "water"]);
        assert_eq!(raw.settings.upgrade_cost, 250.0);
        assert_eq!(raw.settings.upgrade_cost_multiplier, 1.5);
        assert!(raw.settings.enabled);

        let RawSection::Section(levels) = &raw.generator_levels["overworld"] else {
            panic!("overworld should be a section");
        };
        let RawSection::Section(level_one) = &levels[&RawKey::Int(1)] else {
            panic!("level 1 should be a section");
        };
        assert_eq!(level_one["stone"], RawWeight::Number(80.0));
        assert_eq!(level_one["coal_ore"], RawWeight::Text("20".into()));

        let RawSection::Section(level_two) = &levels[&RawKey::Text("2".into())] else {
            panic!("level 2 should be a section");
        };
        assert!(matches!(level_two["gold_ore"], RawWeight::Invalid(_)));
        assert!(matches!(levels[&RawKey::from("broken")], RawSection::Invalid(_)));
        assert!(matches!(raw.generator_levels["nether"], RawSection::Invalid(_)));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let raw = RawConfig::from_ron_str("()").unwrap();
        assert_eq!(raw, RawConfig::default());
        assert_eq!(raw.settings.max_player_distance, 5.0);
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(RawConfig::from_ron_str("(spawn_delay: ").is_err());
    }

    #[test]
    fn builder_creates_nested_sections() {
        let raw = RawConfig::new()
            .with_weight("overworld", 1, "stone", RawWeight::Number(1.0))
            .with_weight("overworld", 1, "coal_ore", RawWeight::Number(2.0))
            .with_replaceable("air");
        let RawSection::Section(levels) = &raw.generator_levels["overworld"] else {
            panic!("overworld should be a section");
        };
        let RawSection::Section(materials) = &levels[&RawKey::Int(1)] else {
            panic!("level 1 should be a section");
        };
        assert_eq!(materials.len(), 2);
        assert_eq!(raw.settings.replaceable_blocks, vec!["air"]);
    }
}
