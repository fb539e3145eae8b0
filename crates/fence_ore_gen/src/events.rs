//! Notifications emitted by [`crate::scheduler::SpawnScheduler`] and
//! [`crate::generator::FenceOreGen`].
//!
//! Hosts observe the generator by handing it an [`EventSink`]. The unit type
//! discards everything; [`VecSink`] records events for inspection.
use uuid::Uuid;

use crate::material::Material;
use crate::world::BlockLocation;

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorEvent {
    /// A spawn was queued for a later tick.
    SpawnScheduled {
        target: BlockLocation,
        category: String,
        level: u32,
        due_tick: u64,
    },

    /// A block was overwritten with a drawn material.
    BlockGenerated {
        target: BlockLocation,
        category: String,
        level: u32,
        material: Material,
    },

    /// A spawn fired but its target was no longer replaceable.
    SpawnDropped {
        target: BlockLocation,
        /// Material found at the target at fire time.
        found: Material,
    },

    /// A spawn fired for a world the host no longer has loaded.
    WorldUnavailable { target: BlockLocation },

    /// Pending spawns discarded on shutdown.
    SpawnsCancelled { count: usize },

    /// A new configuration snapshot was published.
    ConfigReloaded { warnings: usize },

    LevelChanged { player: Uuid, from: u32, to: u32 },

    /// Non-fatal failure, such as player data that could not be written.
    Warning { context: String, message: String },
}

pub trait EventSink {
    fn send(&mut self, event: GeneratorEvent);
}

impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: GeneratorEvent) {}
}

/// Records every event in arrival order.
#[derive(Debug, Default)]
pub struct VecSink {
    events: Vec<GeneratorEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[GeneratorEvent] {
        &self.events
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: GeneratorEvent) {
        self.events.push(event);
    }
}
