//! Weighted material selection.
//!
//! [`pick`] resolves a category and level against a [`WeightTable`] and draws one
//! material proportionally to its weight:
//! - unknown category falls back to [`DEFAULT_CATEGORY`],
//! - unknown level falls back to level 1,
//! - anything still missing, empty, or zero-weight yields [`Material::STONE`].
//!
//! Randomness comes from the caller through [rand::Rng], so tests can pass a
//! fixed or seeded source. Selection never fails and never mutates the table.
use rand::Rng;

use crate::material::Material;
use crate::table::{LevelWeights, WeightTable};
use crate::world::DEFAULT_CATEGORY;

/// Level every category falls back to when the requested one is missing.
pub const FALLBACK_LEVEL: u32 = 1;

/// Material returned whenever there is nothing to draw from.
pub const DEFAULT_MATERIAL: Material = Material::STONE;

/// Uniform value in `[0, 1)` with 53 bits of precision.
#[inline]
pub(crate) fn rand01<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Resolves the weights that apply to `(category, level)`, following the fallback
/// chain. `None` means the default material applies.
pub fn resolve_weights<'a>(
    table: &'a WeightTable,
    category: &str,
    level: u32,
) -> Option<&'a LevelWeights> {
    let levels = table
        .category(category)
        .or_else(|| table.category(DEFAULT_CATEGORY))?;
    levels.get(&level).or_else(|| levels.get(&FALLBACK_LEVEL))
}

/// Draws a material for `(category, level)`.
pub fn pick<R: Rng + ?Sized>(
    table: &WeightTable,
    category: &str,
    level: u32,
    rng: &mut R,
) -> Material {
    match resolve_weights(table, category, level) {
        Some(weights) => pick_weighted(weights, rng),
        None => DEFAULT_MATERIAL,
    }
}

/// Draws from a single level's weights.
///
/// `r` is uniform in `[0, total)`; entries are walked in order and the first whose
/// running sum reaches `r` wins, so each entry owns `(previous_sum, running_sum]`.
pub fn pick_weighted<R: Rng + ?Sized>(weights: &LevelWeights, rng: &mut R) -> Material {
    let total = weights.total();
    if !total.is_finite() || total <= 0.0 {
        return DEFAULT_MATERIAL;
    }

    let roll = rand01(rng) * total;
    let mut acc = 0.0;
    let mut last_positive = None;
    for &(material, weight) in weights.entries() {
        if weight <= 0.0 {
            continue;
        }
        acc += weight;
        last_positive = Some(material);
        if roll <= acc {
            return material;
        }
    }

    // float accumulation can leave `acc` a hair below `roll`
    last_positive.unwrap_or(DEFAULT_MATERIAL)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use rand::rngs::StdRng;
    use rand::{SeedableRng, TryRng};

    use super::*;

    struct FixedRng {
        value: u64,
    }

    impl TryRng for FixedRng {
        type Error = Infallible;

        fn try_next_u32(&mut self) -> Result<u32, Infallible> {
            Ok((self.value >> 32) as u32)
        }

        fn try_next_u64(&mut self) -> Result<u64, Infallible> {
            Ok(self.value)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Infallible> {
            let bytes = self.value.to_le_bytes();
            for (i, b) in dest.iter_mut().enumerate() {
                *b = bytes[i % 8];
            }
            Ok(())
        }
    }

    fn fixed(fraction: f64) -> FixedRng {
        FixedRng {
            value: ((fraction * (1u64 << 53) as f64) as u64) << 11,
        }
    }

    fn coal() -> Material {
        crate::material::MaterialRegistry::new()
            .resolve("coal_ore")
            .unwrap()
    }

    fn two_entry_table() -> WeightTable {
        WeightTable::new().with_level(
            "overworld",
            1,
            [(Material::COBBLESTONE, 1.0), (coal(), 3.0)],
        )
    }

    #[test]
    fn rand01_stays_in_unit_interval() {
        assert_eq!(rand01(&mut FixedRng { value: 0 }), 0.0);
        assert!(rand01(&mut FixedRng { value: u64::MAX }) < 1.0);
    }

    #[test]
    fn roll_selects_by_interval() {
        let table = two_entry_table();
        // total = 4: cobblestone owns [0, 1], coal owns (1, 4)
        assert_eq!(pick(&table, "overworld", 1, &mut fixed(0.0)), Material::COBBLESTONE);
        assert_eq!(pick(&table, "overworld", 1, &mut fixed(0.25)), Material::COBBLESTONE);
        assert_eq!(pick(&table, "overworld", 1, &mut fixed(0.26)), coal());
        assert_eq!(pick(&table, "overworld", 1, &mut fixed(0.999)), coal());
    }

    #[test]
    fn draws_converge_to_weight_ratio() {
        let table = two_entry_table();
        let mut rng = StdRng::seed_from_u64(2025);
        let draws = 10_000;
        let coal_hits = (0..draws)
            .filter(|_| pick(&table, "overworld", 1, &mut rng) == coal())
            .count();
        let ratio = coal_hits as f64 / draws as f64;
        assert!((ratio - 0.75).abs() < 0.03, "coal ratio was {ratio}");
    }

    #[test]
    fn unknown_category_falls_back_to_overworld() {
        let table = WeightTable::new()
            .with_level("overworld", 1, [(Material::COBBLESTONE, 1.0)])
            .with_level("nether", 1, [(coal(), 1.0)]);
        assert_eq!(pick(&table, "aether", 1, &mut fixed(0.5)), Material::COBBLESTONE);
        assert_eq!(pick(&table, "NETHER", 1, &mut fixed(0.5)), coal());
    }

    #[test]
    fn unknown_level_falls_back_to_level_one() {
        let table = WeightTable::new()
            .with_level("overworld", 1, [(Material::COBBLESTONE, 1.0)])
            .with_level("overworld", 2, [(coal(), 1.0)]);
        assert_eq!(pick(&table, "overworld", 9, &mut fixed(0.5)), Material::COBBLESTONE);
        assert_eq!(pick(&table, "overworld", 2, &mut fixed(0.5)), coal());
    }

    #[test]
    fn missing_fallbacks_yield_default_material() {
        // no overworld category at all
        let table = WeightTable::new().with_level("nether", 1, [(coal(), 1.0)]);
        assert_eq!(pick(&table, "the_end", 1, &mut fixed(0.5)), DEFAULT_MATERIAL);

        // category exists but neither the level nor level 1 does
        let table = WeightTable::new().with_level("overworld", 3, [(coal(), 1.0)]);
        assert_eq!(pick(&table, "overworld", 2, &mut fixed(0.5)), DEFAULT_MATERIAL);

        assert_eq!(pick(&WeightTable::new(), "overworld", 1, &mut fixed(0.5)), DEFAULT_MATERIAL);
    }

    #[test]
    fn empty_or_zero_weight_levels_yield_default_material() {
        let mut table = WeightTable::new();
        table.insert_level("overworld", 1, LevelWeights::new());
        table.insert_level(
            "overworld",
            2,
            [(coal(), 0.0), (Material::COBBLESTONE, 0.0)].into_iter().collect(),
        );
        for value in [0.0, 0.5, 0.999] {
            assert_eq!(pick(&table, "overworld", 1, &mut fixed(value)), DEFAULT_MATERIAL);
            assert_eq!(pick(&table, "overworld", 2, &mut fixed(value)), DEFAULT_MATERIAL);
        }
    }

    #[test]
    fn zero_weight_entries_are_never_drawn() {
        let weights: LevelWeights = [(coal(), 0.0), (Material::COBBLESTONE, 2.0)]
            .into_iter()
            .collect();
        assert_eq!(pick_weighted(&weights, &mut fixed(0.0)), Material::COBBLESTONE);
    }

    #[test]
    fn top_of_range_returns_last_positive_entry() {
        let weights: LevelWeights = [
            (coal(), 0.1),
            (Material::COBBLESTONE, 0.2),
            (Material::AIR, 0.0),
        ]
        .into_iter()
        .collect();
        let mut rng = FixedRng { value: u64::MAX };
        assert_eq!(pick_weighted(&weights, &mut rng), Material::COBBLESTONE);
    }
}
