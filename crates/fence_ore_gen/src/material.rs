//! Material identifiers and the registry that resolves and classifies them.
//!
//! A [`Material`] is a compact id into a [`MaterialRegistry`]. The registry is built
//! once at startup from the built-in material list plus any extra names the host
//! knows about, and precomputes:
//! - a case-insensitive name index used by the configuration loader,
//! - the fence-like set (names ending in `_fence` or `_fence_gate`),
//! - the water material.
//!
//! Classification is by naming convention, so extra fence materials registered by
//! the host are recognized without touching this module.
use std::collections::{HashMap, HashSet};

/// Compact material id. Valid only for the [`MaterialRegistry`] that produced it,
/// except for the built-in constants which every registry shares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Material(u16);

impl Material {
    pub const AIR: Material = Material(0);
    /// Default material returned whenever selection has nothing to draw from.
    pub const STONE: Material = Material(1);
    pub const WATER: Material = Material(2);
    pub const COBBLESTONE: Material = Material(3);

    /// Raw index of this material inside its registry.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Built-in materials. The first four entries back the constants on [`Material`].
const BUILTIN_NAMES: &[&str] = &[
    "air",
    "stone",
    "water",
    "cobblestone",
    "lava",
    "dirt",
    "grass_block",
    "sand",
    "gravel",
    "glass",
    "obsidian",
    "deepslate",
    "cobbled_deepslate",
    "netherrack",
    "blackstone",
    "basalt",
    "end_stone",
    "oak_planks",
    // ores
    "coal_ore",
    "iron_ore",
    "copper_ore",
    "gold_ore",
    "redstone_ore",
    "lapis_ore",
    "diamond_ore",
    "emerald_ore",
    "deepslate_coal_ore",
    "deepslate_iron_ore",
    "deepslate_copper_ore",
    "deepslate_gold_ore",
    "deepslate_redstone_ore",
    "deepslate_lapis_ore",
    "deepslate_diamond_ore",
    "deepslate_emerald_ore",
    "nether_quartz_ore",
    "nether_gold_ore",
    "ancient_debris",
    // storage blocks
    "coal_block",
    "iron_block",
    "gold_block",
    "diamond_block",
    "emerald_block",
    // fences
    "oak_fence",
    "spruce_fence",
    "birch_fence",
    "jungle_fence",
    "acacia_fence",
    "dark_oak_fence",
    "mangrove_fence",
    "cherry_fence",
    "bamboo_fence",
    "crimson_fence",
    "warped_fence",
    "nether_brick_fence",
    "oak_fence_gate",
    "spruce_fence_gate",
    "birch_fence_gate",
    "jungle_fence_gate",
    "acacia_fence_gate",
    "dark_oak_fence_gate",
    "mangrove_fence_gate",
    "cherry_fence_gate",
    "bamboo_fence_gate",
    "crimson_fence_gate",
    "warped_fence_gate",
];

const FENCE_SUFFIXES: &[&str] = &["_fence", "_fence_gate"];

/// Normalizes a material name the way configuration files spell them: trimmed,
/// lowercase, optional `minecraft:` namespace removed, spaces and hyphens as `_`.
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    let lower = trimmed.to_ascii_lowercase();
    let bare = lower.strip_prefix("minecraft:").unwrap_or(&lower);
    bare.chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

fn is_fence_name(name: &str) -> bool {
    FENCE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Registry of known materials with precomputed classification.
#[derive(Debug, Clone)]
pub struct MaterialRegistry {
    names: Vec<String>,
    by_name: HashMap<String, Material>,
    fence_like: HashSet<Material>,
}

impl MaterialRegistry {
    /// Creates a registry holding only the built-in materials.
    pub fn new() -> Self {
        Self::with_extra(std::iter::empty::<&str>())
    }

    /// Creates a registry holding the built-in materials plus `extra` names.
    ///
    /// Extra names are normalized with [`normalize_name`]; duplicates of built-in or
    /// earlier names are ignored.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self {
            names: Vec::with_capacity(BUILTIN_NAMES.len()),
            by_name: HashMap::with_capacity(BUILTIN_NAMES.len()),
            fence_like: HashSet::new(),
        };
        for name in BUILTIN_NAMES {
            registry.insert(name);
        }
        for name in extra {
            let normalized = normalize_name(name.as_ref());
            if !normalized.is_empty() {
                registry.insert(&normalized);
            }
        }
        registry
    }

    fn insert(&mut self, name: &str) {
        if self.by_name.contains_key(name) {
            return;
        }
        let Ok(index) = u16::try_from(self.names.len()) else {
            tracing::warn!("Material registry is full, ignoring '{}'.", name);
            return;
        };
        let material = Material(index);
        self.names.push(name.to_owned());
        self.by_name.insert(name.to_owned(), material);
        if is_fence_name(name) {
            self.fence_like.insert(material);
        }
    }

    /// Returns the number of registered materials.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no materials are registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolves a configuration-style name, case-insensitively.
    pub fn resolve(&self, name: &str) -> Option<Material> {
        self.by_name.get(&normalize_name(name)).copied()
    }

    /// Canonical name of `material`, or `"unknown"` for an id from another registry.
    pub fn name(&self, material: Material) -> &str {
        self.names
            .get(material.index())
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    #[inline]
    pub fn is_fence_like(&self, material: Material) -> bool {
        self.fence_like.contains(&material)
    }

    #[inline]
    pub fn is_water(&self, material: Material) -> bool {
        material == Material::WATER
    }

    #[inline]
    pub fn is_air(&self, material: Material) -> bool {
        material == Material::AIR
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new()
    }
}
