//! Host-facing facade.
//!
//! [`FenceOreGen`] owns every piece of generator state and exposes one method per
//! host event (fence placed, water flow, player join, tick, shutdown) and per
//! command. The host calls these from its tick thread.
use std::sync::Arc;

use glam::{IVec3, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};
use uuid::Uuid;

use crate::commands::{
    self, CommandError, CommandReply, LevelChange, PlayerLookup, Requester,
};
use crate::config::{ConfigHandle, ConfigSource, GeneratorConfig, LoadWarning};
use crate::economy::Economy;
use crate::error::Result;
use crate::events::{EventSink, GeneratorEvent};
use crate::material::MaterialRegistry;
use crate::progression::{PlayerDataFile, ProgressionStore};
use crate::scheduler::{ScheduleOutcome, SpawnScheduler};
use crate::trigger::{fence_placement_target, water_flow_target};
use crate::world::{BlockAccess, BlockLocation, WorldInfo, Worlds};

/// A player currently in the world, as seen by the water-flow trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OnlinePlayer {
    pub id: Uuid,
    pub position: Vec3,
}

impl OnlinePlayer {
    pub fn new(id: Uuid, position: impl Into<Vec3>) -> Self {
        Self {
            id,
            position: position.into(),
        }
    }
}

/// What the host should do with a water-flow event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDecision {
    /// Let the water flow.
    Allow,
    /// Cancel the flow; the wet cell was handed to the scheduler.
    Suppress(ScheduleOutcome),
}

impl FlowDecision {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, FlowDecision::Suppress(_))
    }
}

pub struct FenceOreGen<S: EventSink = ()> {
    registry: Arc<MaterialRegistry>,
    config: ConfigHandle,
    source: Box<dyn ConfigSource>,
    progression: ProgressionStore,
    player_data: Option<PlayerDataFile>,
    scheduler: SpawnScheduler,
    rng: StdRng,
    sink: S,
}

impl FenceOreGen<()> {
    /// Loads configuration from `source`. Fails only if the source cannot be read
    /// or parsed; row-level problems are logged.
    pub fn new(registry: MaterialRegistry, source: impl ConfigSource + 'static) -> Result<Self> {
        let (config, warnings) = ConfigHandle::load(&source, &registry)?;
        if !warnings.is_empty() {
            warn!("Configuration loaded with {} warnings.", warnings.len());
        }
        Ok(Self {
            registry: Arc::new(registry),
            config,
            source: Box::new(source),
            progression: ProgressionStore::new(),
            player_data: None,
            scheduler: SpawnScheduler::new(),
            rng: StdRng::seed_from_u64(rand::rng().next_u64()),
            sink: (),
        })
    }
}

impl<S: EventSink> FenceOreGen<S> {
    /// Replaces the event sink.
    pub fn with_sink<T: EventSink>(self, sink: T) -> FenceOreGen<T> {
        FenceOreGen {
            registry: self.registry,
            config: self.config,
            source: self.source,
            progression: self.progression,
            player_data: self.player_data,
            scheduler: self.scheduler,
            rng: self.rng,
            sink,
        }
    }

    /// Reseeds the generator's random source, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Loads player levels from `file`, merging its legacy files once. Levels are
    /// saved back there after every change and on shutdown.
    pub fn with_player_data(mut self, file: PlayerDataFile) -> Result<Self> {
        self.progression = file.load_and_migrate()?;
        self.player_data = Some(file);
        Ok(self)
    }

    pub fn with_progression(mut self, store: ProgressionStore) -> Self {
        self.progression = store;
        self
    }

    pub fn registry(&self) -> &MaterialRegistry {
        &self.registry
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<GeneratorConfig> {
        self.config.snapshot()
    }

    /// Shareable handle to the configuration, for readers on other threads.
    pub fn config_handle(&self) -> &ConfigHandle {
        &self.config
    }

    pub fn progression(&self) -> &ProgressionStore {
        &self.progression
    }

    pub fn scheduler(&self) -> &SpawnScheduler {
        &self.scheduler
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn is_active(config: &GeneratorConfig, world: &WorldInfo<'_>) -> bool {
        config.enabled && !config.is_world_disabled(world.name)
    }

    /// A block was placed at `pos` by `player`. Returns `None` when nothing triggers.
    pub fn on_fence_placed<W: BlockAccess + ?Sized>(
        &mut self,
        world: &mut W,
        info: WorldInfo<'_>,
        pos: impl Into<IVec3>,
        player: Uuid,
    ) -> Option<ScheduleOutcome> {
        let config = self.config.snapshot();
        if !Self::is_active(&config, &info) {
            return None;
        }
        let target = fence_placement_target(world, &self.registry, pos.into())?;
        let level = self.progression.get_level(player);
        Some(self.scheduler.schedule(
            world,
            &config,
            BlockLocation::new(info.name, target),
            info.dimension.category(),
            level,
            &mut self.rng,
            &mut self.sink,
        ))
    }

    /// Water is about to flow from `from` into `to`. The level comes from the
    /// nearest of `players` within the configured distance, 1 if none is close.
    pub fn on_water_flow<W: BlockAccess + ?Sized>(
        &mut self,
        world: &mut W,
        info: WorldInfo<'_>,
        from: impl Into<IVec3>,
        to: impl Into<IVec3>,
        players: &[OnlinePlayer],
    ) -> FlowDecision {
        let config = self.config.snapshot();
        if !Self::is_active(&config, &info) {
            return FlowDecision::Allow;
        }
        let Some(target) = water_flow_target(world, &self.registry, from.into(), to.into())
        else {
            return FlowDecision::Allow;
        };
        let level = nearest_player(players, target, config.max_player_distance)
            .map(|id| self.progression.get_level(id))
            .unwrap_or(crate::progression::DEFAULT_LEVEL);
        FlowDecision::Suppress(self.scheduler.schedule(
            world,
            &config,
            BlockLocation::new(info.name, target),
            info.dimension.category(),
            level,
            &mut self.rng,
            &mut self.sink,
        ))
    }

    /// Records a joining player at level 1 if they have no level yet.
    pub fn on_player_join(&mut self, id: Uuid) {
        if self.progression.ensure_player(id) {
            tracing::debug!("New player {} starts at level 1.", id);
        }
    }

    /// Advances one host tick, running due spawns in the worlds they were scheduled
    /// in. Call once per tick, not once per world. Returns how many fired.
    pub fn tick<W: Worlds + ?Sized>(&mut self, worlds: &mut W) -> usize {
        self.scheduler
            .tick(worlds, &self.config, &mut self.rng, &mut self.sink)
    }

    /// Cancels pending spawns and saves player levels. Returns the number cancelled.
    pub fn shutdown(&mut self) -> Result<usize> {
        let cancelled = self.scheduler.shutdown(&mut self.sink);
        if let Some(file) = &self.player_data {
            file.save(&self.progression)?;
        }
        info!("Generator shut down, {} pending spawns cancelled.", cancelled);
        Ok(cancelled)
    }

    fn persist_levels(&mut self) {
        let Some(file) = &self.player_data else {
            return;
        };
        if let Err(err) = file.save(&self.progression) {
            warn!("Player levels could not be saved: {}", err);
            self.sink.send(GeneratorEvent::Warning {
                context: file.path().display().to_string(),
                message: err.to_string(),
            });
        }
    }

    fn record_level_change(&mut self, change: LevelChange) {
        self.sink.send(GeneratorEvent::LevelChanged {
            player: change.player,
            from: change.from,
            to: change.to,
        });
        self.persist_levels();
    }

    pub fn query_level(
        &self,
        lookup: &dyn PlayerLookup,
        requester: &Requester,
        target: Option<&str>,
    ) -> std::result::Result<CommandReply, CommandError> {
        commands::query_level(&self.progression, lookup, requester, target)
    }

    /// Sets the level of `target` (or the requester) and saves player data.
    pub fn set_level(
        &mut self,
        lookup: &dyn PlayerLookup,
        requester: &Requester,
        target: Option<&str>,
        level: u32,
    ) -> std::result::Result<CommandReply, CommandError> {
        let config = self.config.snapshot();
        let (change, reply) = commands::set_level(
            &mut self.progression,
            &config,
            lookup,
            requester,
            target,
            level,
        )?;
        self.record_level_change(change);
        Ok(reply)
    }

    /// Buys the requester's next level through `economy` and saves player data.
    pub fn upgrade(
        &mut self,
        requester: &Requester,
        economy: Option<&mut dyn Economy>,
    ) -> std::result::Result<CommandReply, CommandError> {
        let config = self.config.snapshot();
        let from = self.progression.get_level(requester.id);
        let reply = commands::upgrade(&mut self.progression, &config, requester, economy)?;
        self.record_level_change(LevelChange {
            player: requester.id,
            from,
            to: from + 1,
        });
        Ok(reply)
    }

    /// Rebuilds the configuration from the source and swaps it in. On failure the
    /// previous configuration stays in effect.
    pub fn reload(
        &mut self,
        requester: &Requester,
    ) -> std::result::Result<CommandReply, CommandError> {
        if !requester.admin {
            return Err(CommandError::NoPermission);
        }
        let warnings = self.reload_config().map_err(|err| {
            warn!("Reload from {} failed: {}", self.source.describe(), err);
            CommandError::ReloadFailed {
                reason: err.to_string(),
            }
        })?;
        Ok(CommandReply::Reloaded {
            warnings: warnings.len(),
        })
    }

    /// Reload without a permission check, for host-driven reloads.
    pub fn reload_config(&mut self) -> Result<Vec<LoadWarning>> {
        let warnings = self.config.reload(self.source.as_ref(), &self.registry)?;
        self.sink.send(GeneratorEvent::ConfigReloaded {
            warnings: warnings.len(),
        });
        Ok(warnings)
    }
}

/// Nearest player within `max_distance` of `target`; ties go to the first listed.
fn nearest_player(players: &[OnlinePlayer], target: IVec3, max_distance: f64) -> Option<Uuid> {
    let origin = target.as_vec3();
    let mut best: Option<(Uuid, f32)> = None;
    for player in players {
        let distance = player.position.distance(origin);
        if f64::from(distance) > max_distance {
            continue;
        }
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((player.id, distance));
        }
    }
    best.map(|(id, _)| id)
}
