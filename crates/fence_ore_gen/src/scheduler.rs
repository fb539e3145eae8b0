//! Delayed, re-validated block mutation.
//!
//! [`SpawnScheduler`] keeps a tick clock and a min-queue of [`PendingSpawn`]s ordered
//! by `(due_tick, seq)`. A spawn is consumed exactly once: it either writes a drawn
//! material or, when the target stopped being replaceable during the delay, is
//! dropped without touching the world. At most one spawn is pending per target.
//!
//! Targets carry their world's name. The clock is global to the host, so
//! [`SpawnScheduler::tick`] runs once per host tick and resolves each due spawn's
//! world through [`Worlds`].
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use rand::Rng;
use tracing::{debug, warn};

use crate::config::{ConfigHandle, GeneratorConfig};
use crate::events::{EventSink, GeneratorEvent};
use crate::material::Material;
use crate::selection::pick;
use crate::world::{BlockAccess, BlockLocation, Worlds};

/// A queued block conversion.
#[derive(Debug, Clone)]
pub struct PendingSpawn {
    pub target: BlockLocation,
    pub category: String,
    pub level: u32,
    pub due_tick: u64,
    seq: u64,
}

impl PendingSpawn {
    fn key(&self) -> (u64, u64) {
        (self.due_tick, self.seq)
    }
}

impl PartialEq for PendingSpawn {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PendingSpawn {}

impl PartialOrd for PendingSpawn {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingSpawn {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Result of running one spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    Generated(Material),
    /// Target held a non-replaceable material; nothing was written.
    Dropped { found: Material },
}

/// Result of [`SpawnScheduler::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Zero delay: the spawn already ran.
    Executed(SpawnOutcome),
    Scheduled { due_tick: u64 },
    /// A spawn for this target is already queued; the request was ignored.
    AlreadyPending,
}

/// Re-validates `target` against `config` and, if still replaceable, overwrites it.
/// `world` must be the world `target` names.
pub fn execute_spawn<W, R, S>(
    world: &mut W,
    config: &GeneratorConfig,
    target: &BlockLocation,
    category: &str,
    level: u32,
    rng: &mut R,
    sink: &mut S,
) -> SpawnOutcome
where
    W: BlockAccess + ?Sized,
    R: Rng + ?Sized,
    S: EventSink + ?Sized,
{
    let found = world.material_at(target.pos);
    if !config.replaceable.contains(found) {
        debug!("Dropping spawn at {}: target is no longer replaceable.", target);
        sink.send(GeneratorEvent::SpawnDropped {
            target: target.clone(),
            found,
        });
        return SpawnOutcome::Dropped { found };
    }

    let material = pick(&config.table, category, level, rng);
    world.set_material(target.pos, material);
    sink.send(GeneratorEvent::BlockGenerated {
        target: target.clone(),
        category: category.to_owned(),
        level,
        material,
    });
    SpawnOutcome::Generated(material)
}

#[derive(Debug, Default)]
pub struct SpawnScheduler {
    queue: BinaryHeap<Reverse<PendingSpawn>>,
    pending: HashSet<BlockLocation>,
    now: u64,
    next_seq: u64,
}

impl SpawnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks elapsed since creation.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_pending(&self, target: &BlockLocation) -> bool {
        self.pending.contains(target)
    }

    /// Runs the spawn now when `config.spawn_delay` is 0, otherwise queues it.
    /// `world` is the world `target` names; it is only touched on the zero-delay path.
    #[allow(clippy::too_many_arguments)]
    pub fn schedule<W, R, S>(
        &mut self,
        world: &mut W,
        config: &GeneratorConfig,
        target: BlockLocation,
        category: &str,
        level: u32,
        rng: &mut R,
        sink: &mut S,
    ) -> ScheduleOutcome
    where
        W: BlockAccess + ?Sized,
        R: Rng + ?Sized,
        S: EventSink + ?Sized,
    {
        if self.pending.contains(&target) {
            return ScheduleOutcome::AlreadyPending;
        }
        if config.spawn_delay == 0 {
            let outcome = execute_spawn(world, config, &target, category, level, rng, sink);
            return ScheduleOutcome::Executed(outcome);
        }

        let due_tick = self.now.saturating_add(config.spawn_delay);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(target.clone());
        sink.send(GeneratorEvent::SpawnScheduled {
            target: target.clone(),
            category: category.to_owned(),
            level,
            due_tick,
        });
        self.queue.push(Reverse(PendingSpawn {
            target,
            category: category.to_owned(),
            level,
            due_tick,
            seq,
        }));
        ScheduleOutcome::Scheduled { due_tick }
    }

    /// Advances the clock one tick and runs every spawn now due, each in its own
    /// world and against the snapshot current at that moment. Spawns whose world
    /// is not loaded are discarded. Returns how many spawns fired.
    pub fn tick<W, R, S>(
        &mut self,
        worlds: &mut W,
        handle: &ConfigHandle,
        rng: &mut R,
        sink: &mut S,
    ) -> usize
    where
        W: Worlds + ?Sized,
        R: Rng + ?Sized,
        S: EventSink + ?Sized,
    {
        self.now += 1;
        let mut fired = 0;
        while self
            .queue
            .peek()
            .is_some_and(|Reverse(spawn)| spawn.due_tick <= self.now)
        {
            let Some(Reverse(spawn)) = self.queue.pop() else {
                break;
            };
            self.pending.remove(&spawn.target);
            let Some(world) = worlds.world_mut(&spawn.target.world) else {
                warn!("Discarding spawn at {}: world is not loaded.", spawn.target);
                sink.send(GeneratorEvent::WorldUnavailable {
                    target: spawn.target,
                });
                continue;
            };
            let config = handle.snapshot();
            execute_spawn(
                world,
                &config,
                &spawn.target,
                &spawn.category,
                spawn.level,
                rng,
                sink,
            );
            fired += 1;
        }
        fired
    }

    /// Discards all pending spawns. Returns how many were cancelled.
    pub fn shutdown<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let count = self.queue.len();
        self.queue.clear();
        self.pending.clear();
        if count > 0 {
            debug!("Cancelled {} pending spawns.", count);
            sink.send(GeneratorEvent::SpawnsCancelled { count });
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use glam::IVec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::events::VecSink;
    use crate::material::MaterialRegistry;
    use crate::table::{ReplaceableSet, WeightTable};
    use crate::world::GridWorld;

    const OVERWORLD: &str = "world";
    const NETHER: &str = "world_nether";

    fn config(delay: u64, ore: Material) -> GeneratorConfig {
        GeneratorConfig::new(
            WeightTable::new().with_level("overworld", 1, [(ore, 1.0)]),
            [Material::AIR, Material::WATER].into_iter().collect(),
        )
        .with_spawn_delay(delay)
    }

    fn coal() -> Material {
        MaterialRegistry::new().resolve("coal_ore").unwrap()
    }

    fn at(pos: IVec3) -> BlockLocation {
        BlockLocation::new(OVERWORLD, pos)
    }

    fn worlds() -> HashMap<String, GridWorld> {
        HashMap::from([
            (OVERWORLD.to_owned(), GridWorld::new()),
            (NETHER.to_owned(), GridWorld::new()),
        ])
    }

    fn overworld(worlds: &mut HashMap<String, GridWorld>) -> &mut GridWorld {
        worlds.get_mut(OVERWORLD).unwrap()
    }

    #[test]
    fn zero_delay_runs_synchronously() {
        let mut scheduler = SpawnScheduler::new();
        let mut world = GridWorld::new();
        let mut rng = StdRng::seed_from_u64(1);
        let target = IVec3::new(1, 2, 3);
        let outcome = scheduler.schedule(
            &mut world,
            &config(0, coal()),
            at(target),
            "overworld",
            1,
            &mut rng,
            &mut (),
        );
        assert_eq!(outcome, ScheduleOutcome::Executed(SpawnOutcome::Generated(coal())));
        assert_eq!(world.material_at(target), coal());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn delayed_spawn_fires_on_due_tick() {
        let handle = ConfigHandle::new(config(3, coal()));
        let mut scheduler = SpawnScheduler::new();
        let mut worlds = worlds();
        let mut rng = StdRng::seed_from_u64(1);
        let mut sink = VecSink::new();
        let target = at(IVec3::ZERO);

        let outcome = scheduler.schedule(
            overworld(&mut worlds),
            &handle.snapshot(),
            target.clone(),
            "overworld",
            1,
            &mut rng,
            &mut sink,
        );
        assert_eq!(outcome, ScheduleOutcome::Scheduled { due_tick: 3 });
        assert!(scheduler.is_pending(&target));

        for _ in 0..2 {
            assert_eq!(scheduler.tick(&mut worlds, &handle, &mut rng, &mut sink), 0);
        }
        assert_eq!(worlds[OVERWORLD].material_at(target.pos), Material::AIR);
        assert_eq!(scheduler.tick(&mut worlds, &handle, &mut rng, &mut sink), 1);
        assert_eq!(worlds[OVERWORLD].material_at(target.pos), coal());
        assert!(!scheduler.is_pending(&target));
        assert!(matches!(
            sink.as_slice().last(),
            Some(GeneratorEvent::BlockGenerated { material, .. }) if *material == coal()
        ));
    }

    #[test]
    fn spawns_fire_in_the_world_they_were_scheduled_in() {
        let registry = MaterialRegistry::new();
        let netherrack = registry.resolve("netherrack").unwrap();
        let mut table = config(2, coal());
        table.table = table.table.with_level("nether", 1, [(netherrack, 1.0)]);
        let handle = ConfigHandle::new(table);
        let mut scheduler = SpawnScheduler::new();
        let mut worlds = worlds();
        let mut rng = StdRng::seed_from_u64(5);
        let pos = IVec3::new(4, 40, 4);
        let snapshot = handle.snapshot();

        let in_nether = BlockLocation::new(NETHER, pos);
        let first = scheduler.schedule(
            worlds.get_mut(NETHER).unwrap(),
            &snapshot,
            in_nether.clone(),
            "nether",
            1,
            &mut rng,
            &mut (),
        );
        assert_eq!(first, ScheduleOutcome::Scheduled { due_tick: 2 });

        // same coordinates, different world: a separate target
        let second = scheduler.schedule(
            overworld(&mut worlds),
            &snapshot,
            at(pos),
            "overworld",
            1,
            &mut rng,
            &mut (),
        );
        assert_eq!(second, ScheduleOutcome::Scheduled { due_tick: 2 });
        assert!(scheduler.is_pending(&in_nether));
        assert!(scheduler.is_pending(&at(pos)));

        scheduler.tick(&mut worlds, &handle, &mut rng, &mut ());
        assert_eq!(scheduler.tick(&mut worlds, &handle, &mut rng, &mut ()), 2);
        assert_eq!(worlds[NETHER].material_at(pos), netherrack);
        assert_eq!(worlds[OVERWORLD].material_at(pos), coal());
        assert_eq!(scheduler.now(), 2);
    }

    #[test]
    fn spawn_for_unloaded_world_is_discarded() {
        let handle = ConfigHandle::new(config(1, coal()));
        let mut scheduler = SpawnScheduler::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut sink = VecSink::new();
        let target = BlockLocation::new("world_the_end", IVec3::ZERO);
        scheduler.schedule(
            &mut GridWorld::new(),
            &handle.snapshot(),
            target.clone(),
            "the_end",
            1,
            &mut rng,
            &mut sink,
        );

        let mut worlds = worlds();
        assert_eq!(scheduler.tick(&mut worlds, &handle, &mut rng, &mut sink), 0);
        assert!(scheduler.is_empty());
        assert!(!scheduler.is_pending(&target));
        assert_eq!(
            sink.as_slice().last(),
            Some(&GeneratorEvent::WorldUnavailable { target })
        );
        assert!(worlds.values().all(GridWorld::is_empty));
    }

    #[test]
    fn changed_target_is_not_mutated() {
        let handle = ConfigHandle::new(config(2, coal()));
        let mut scheduler = SpawnScheduler::new();
        let mut worlds = worlds();
        let mut rng = StdRng::seed_from_u64(7);
        let mut sink = VecSink::new();
        let target = at(IVec3::new(5, 60, 5));
        let planks = MaterialRegistry::new().resolve("oak_planks").unwrap();

        scheduler.schedule(
            overworld(&mut worlds),
            &handle.snapshot(),
            target.clone(),
            "overworld",
            1,
            &mut rng,
            &mut sink,
        );
        // a player builds in the cell during the delay
        overworld(&mut worlds).set_material(target.pos, planks);
        scheduler.tick(&mut worlds, &handle, &mut rng, &mut sink);
        scheduler.tick(&mut worlds, &handle, &mut rng, &mut sink);

        assert_eq!(worlds[OVERWORLD].material_at(target.pos), planks);
        assert!(scheduler.is_empty());
        assert_eq!(
            sink.as_slice().last(),
            Some(&GeneratorEvent::SpawnDropped {
                target,
                found: planks
            })
        );
    }

    #[test]
    fn fire_time_uses_current_snapshot() {
        let registry = MaterialRegistry::new();
        let iron = registry.resolve("iron_ore").unwrap();
        let handle = ConfigHandle::new(config(1, coal()));
        let mut scheduler = SpawnScheduler::new();
        let mut worlds = worlds();
        let mut rng = StdRng::seed_from_u64(3);
        let a = IVec3::ZERO;
        let b = IVec3::X;

        let snapshot = handle.snapshot();
        for pos in [a, b] {
            let world = overworld(&mut worlds);
            scheduler.schedule(world, &snapshot, at(pos), "overworld", 1, &mut rng, &mut ());
        }
        overworld(&mut worlds).set_material(b, Material::STONE);

        // the reload publishes iron and makes stone replaceable
        let mut next = config(1, iron);
        next.replaceable = [Material::AIR, Material::STONE].into_iter().collect();
        handle.publish(next);

        assert_eq!(scheduler.tick(&mut worlds, &handle, &mut rng, &mut ()), 2);
        assert_eq!(worlds[OVERWORLD].material_at(a), iron);
        assert_eq!(worlds[OVERWORLD].material_at(b), iron);
    }

    #[test]
    fn duplicate_target_is_ignored_while_pending() {
        let config = config(5, coal());
        let mut scheduler = SpawnScheduler::new();
        let mut world = GridWorld::new();
        let mut rng = StdRng::seed_from_u64(1);
        let target = at(IVec3::ONE);
        let mut schedule = |level| {
            scheduler.schedule(&mut world, &config, target.clone(), "overworld", level, &mut rng, &mut ())
        };
        let first = schedule(1);
        let second = schedule(2);
        assert_eq!(first, ScheduleOutcome::Scheduled { due_tick: 5 });
        assert_eq!(second, ScheduleOutcome::AlreadyPending);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn spawns_fire_in_due_then_insertion_order() {
        let registry = MaterialRegistry::new();
        let handle = ConfigHandle::new(config(2, coal()));
        let mut scheduler = SpawnScheduler::new();
        let mut worlds = worlds();
        let mut rng = StdRng::seed_from_u64(1);
        let mut sink = VecSink::new();
        let targets = [IVec3::new(0, 0, 0), IVec3::new(1, 0, 0), IVec3::new(2, 0, 0)];

        let snapshot = handle.snapshot();
        for pos in &targets[..2] {
            let world = overworld(&mut worlds);
            scheduler.schedule(world, &snapshot, at(*pos), "overworld", 1, &mut rng, &mut ());
        }
        scheduler.tick(&mut worlds, &handle, &mut rng, &mut sink);
        let shorter = config(1, coal());
        let world = overworld(&mut worlds);
        scheduler.schedule(world, &shorter, at(targets[2]), "overworld", 1, &mut rng, &mut ());
        assert_eq!(scheduler.tick(&mut worlds, &handle, &mut rng, &mut sink), 3);

        let order: Vec<IVec3> = sink
            .as_slice()
            .iter()
            .filter_map(|event| match event {
                GeneratorEvent::BlockGenerated { target, .. } => Some(target.pos),
                _ => None,
            })
            .collect();
        assert_eq!(order, targets.to_vec());
        assert_eq!(registry.name(worlds[OVERWORLD].material_at(targets[2])), "coal_ore");
    }

    #[test]
    fn shutdown_discards_pending_spawns() {
        let handle = ConfigHandle::new(config(1, coal()));
        let mut scheduler = SpawnScheduler::new();
        let mut worlds = worlds();
        let mut rng = StdRng::seed_from_u64(1);
        let mut sink = VecSink::new();
        let snapshot = handle.snapshot();
        for x in 0..3 {
            scheduler.schedule(
                overworld(&mut worlds),
                &snapshot,
                at(IVec3::new(x, 0, 0)),
                "overworld",
                1,
                &mut rng,
                &mut (),
            );
        }
        assert_eq!(scheduler.shutdown(&mut sink), 3);
        assert_eq!(scheduler.tick(&mut worlds, &handle, &mut rng, &mut sink), 0);
        assert!(worlds[OVERWORLD].is_empty());
        assert_eq!(sink.as_slice(), &[GeneratorEvent::SpawnsCancelled { count: 3 }]);
    }

    #[test]
    fn empty_replaceable_set_drops_everything() {
        let mut config = config(0, coal());
        config.replaceable = ReplaceableSet::new();
        let mut world = GridWorld::new();
        let outcome = execute_spawn(
            &mut world,
            &config,
            &at(IVec3::ZERO),
            "overworld",
            1,
            &mut StdRng::seed_from_u64(1),
            &mut (),
        );
        assert_eq!(
            outcome,
            SpawnOutcome::Dropped {
                found: Material::AIR
            }
        );
    }
}
