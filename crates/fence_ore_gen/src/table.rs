//! Weight table: category → level → material weights.
//!
//! [`LevelWeights`] keeps its entries in insertion order so weighted draws walk a
//! fixed, reproducible sequence. Categories are stored lowercase; lookups through
//! [`WeightTable::category`] are case-insensitive.
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::material::Material;

/// Ordered material weights for one level. Weights are finite and non-negative and
/// do not need to sum to one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelWeights {
    entries: Vec<(Material, f64)>,
}

impl LevelWeights {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends `material`, or replaces its weight in place if already present.
    pub fn insert(&mut self, material: Material, weight: f64) {
        match self.entries.iter_mut().find(|(m, _)| *m == material) {
            Some(entry) => entry.1 = weight,
            None => self.entries.push((material, weight)),
        }
    }

    pub fn with(mut self, material: Material, weight: f64) -> Self {
        self.insert(material, weight);
        self
    }

    pub fn entries(&self) -> &[(Material, f64)] {
        &self.entries
    }

    pub fn weight(&self, material: Material) -> Option<f64> {
        self.entries
            .iter()
            .find(|(m, _)| *m == material)
            .map(|(_, w)| *w)
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| *w).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Material, f64)> for LevelWeights {
    fn from_iter<T: IntoIterator<Item = (Material, f64)>>(iter: T) -> Self {
        let mut weights = LevelWeights::new();
        for (material, weight) in iter {
            weights.insert(material, weight);
        }
        weights
    }
}

/// Levels of a single category, ordered by level.
pub type CategoryLevels = BTreeMap<u32, LevelWeights>;

/// Category → level → material weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightTable {
    categories: HashMap<String, CategoryLevels>,
}

impl WeightTable {
    pub fn new() -> Self {
        Self {
            categories: HashMap::new(),
        }
    }

    /// Inserts or replaces one level of `category`.
    pub fn insert_level(&mut self, category: &str, level: u32, weights: LevelWeights) {
        self.categories
            .entry(category.to_ascii_lowercase())
            .or_default()
            .insert(level, weights);
    }

    /// Builder form of [`WeightTable::insert_level`].
    pub fn with_level<I>(mut self, category: &str, level: u32, weights: I) -> Self
    where
        I: IntoIterator<Item = (Material, f64)>,
    {
        self.insert_level(category, level, weights.into_iter().collect());
        self
    }

    /// Replaces all levels of `category`.
    pub fn insert_category(&mut self, category: &str, levels: CategoryLevels) {
        self.categories.insert(category.to_ascii_lowercase(), levels);
    }

    pub fn category(&self, category: &str) -> Option<&CategoryLevels> {
        match self.categories.get(category) {
            Some(levels) => Some(levels),
            None => self.categories.get(&category.to_ascii_lowercase()),
        }
    }

    pub fn level(&self, category: &str, level: u32) -> Option<&LevelWeights> {
        self.category(category).and_then(|levels| levels.get(&level))
    }

    /// Highest configured level of `category`, or 1 if the category is absent.
    pub fn max_level(&self, category: &str) -> u32 {
        self.category(category)
            .and_then(|levels| levels.keys().next_back().copied())
            .unwrap_or(1)
    }

    /// Category names in sorted order.
    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Materials the generator may overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceableSet {
    materials: HashSet<Material>,
}

impl ReplaceableSet {
    pub fn new() -> Self {
        Self {
            materials: HashSet::new(),
        }
    }

    #[inline]
    pub fn contains(&self, material: Material) -> bool {
        self.materials.contains(&material)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl FromIterator<Material> for ReplaceableSet {
    fn from_iter<T: IntoIterator<Item = Material>>(iter: T) -> Self {
        Self {
            materials: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_weights_keep_insertion_order_and_replace_in_place() {
        let mut weights = LevelWeights::new()
            .with(Material::COBBLESTONE, 2.0)
            .with(Material::STONE, 1.0);
        weights.insert(Material::COBBLESTONE, 5.0);
        assert_eq!(
            weights.entries(),
            &[(Material::COBBLESTONE, 5.0), (Material::STONE, 1.0)]
        );
        assert_eq!(weights.total(), 6.0);
    }

    #[test]
    fn category_lookup_ignores_case() {
        let table = WeightTable::new().with_level("Nether", 2, [(Material::STONE, 1.0)]);
        assert!(table.category("nether").is_some());
        assert!(table.category("NETHER").is_some());
        assert!(table.level("nether", 2).is_some());
        assert!(table.level("nether", 1).is_none());
    }

    #[test]
    fn max_level_tracks_highest_key() {
        let table = WeightTable::new()
            .with_level("overworld", 1, [(Material::STONE, 1.0)])
            .with_level("overworld", 7, [(Material::STONE, 1.0)])
            .with_level("overworld", 3, [(Material::STONE, 1.0)]);
        assert_eq!(table.max_level("overworld"), 7);
        assert_eq!(table.max_level("the_end"), 1);
    }

    #[test]
    fn categories_are_sorted() {
        let table = WeightTable::new()
            .with_level("overworld", 1, [(Material::STONE, 1.0)])
            .with_level("nether", 1, [(Material::COBBLESTONE, 1.0)]);
        assert_eq!(table.categories(), vec!["nether", "overworld"]);
    }
}
