#![forbid(unsafe_code)]
//! fence_ore_gen: tiered, weighted ore generation triggered by fences next to water.
//!
//! Modules:
//! - material, world: material registry, block geometry, and the world access seam
//! - config, table: RON configuration, validation into weight tables, atomic reload
//! - selection: weighted draw with category and level fallback
//! - trigger, scheduler: fence/water geometry and delayed, re-validated mutation
//! - progression, economy, commands: player levels, persistence, and paid upgrades
//! - generator: the [`FenceOreGen`](generator::FenceOreGen) facade driven by host events
pub mod commands;
pub mod config;
pub mod economy;
pub mod error;
pub mod events;
pub mod generator;
pub mod material;
pub mod progression;
pub mod scheduler;
pub mod selection;
pub mod table;
pub mod trigger;
pub mod world;

/// Convenient re-exports for common types. Import with `use fence_ore_gen::prelude::*;`.
pub mod prelude {
    pub use crate::commands::{
        CommandError, CommandReply, LevelChange, PlayerLookup, Requester,
    };
    pub use crate::config::{
        load_tables, ConfigHandle, ConfigSource, GeneratorConfig, LoadReport, LoadWarning,
        RawConfig, RawWeight, RonFileSource, StaticSource,
    };
    pub use crate::economy::{Economy, EconomyError, InMemoryEconomy};
    pub use crate::error::{Error, Result};
    pub use crate::events::{EventSink, GeneratorEvent, VecSink};
    pub use crate::generator::{FenceOreGen, FlowDecision, OnlinePlayer};
    pub use crate::material::{Material, MaterialRegistry};
    pub use crate::progression::{PlayerDataFile, ProgressionStore, UpgradePricing};
    pub use crate::scheduler::{ScheduleOutcome, SpawnOutcome, SpawnScheduler};
    pub use crate::selection::{pick, pick_weighted};
    pub use crate::table::{LevelWeights, ReplaceableSet, WeightTable};
    pub use crate::trigger::{fence_placement_target, is_fence_water_adjacent, water_flow_target};
    pub use crate::world::{
        BlockAccess, BlockLocation, Dimension, Direction, GridWorld, WorldInfo, Worlds,
    };
}
