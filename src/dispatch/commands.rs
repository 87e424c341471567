//! Deferred mutations issued from inside user callbacks
//!
//! Callbacks run while the engine iterates its own state, so they may not
//! re-enter mutating APIs directly. They push commands instead; the engine
//! applies the buffer at the tick boundary.

use crate::core::types::Vec3;
use crate::group::EntityHandle;
use crate::observer::ObserverId;
use crate::zone::ZoneId;

pub(crate) enum Command {
    DestroyZone(ZoneId),
    SetZonePosition(ZoneId, Vec3),
    SyncZone(ZoneId),
    RemoveEntity(EntityHandle),
    SetObserverEnabled(ObserverId, bool),
}

/// Mutation buffer handed to every callback
#[derive(Default)]
pub struct Commands {
    pub(crate) queue: Vec<Command>,
}

impl Commands {
    pub(crate) fn new() -> Self {
        Self { queue: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue a zone for destruction; its exit events fire at the next tick's
    /// flush, never inside the current callback
    pub fn destroy_zone(&mut self, zone: ZoneId) {
        self.queue.push(Command::DestroyZone(zone));
    }

    pub fn set_zone_position(&mut self, zone: ZoneId, position: Vec3) {
        self.queue.push(Command::SetZonePosition(zone, position));
    }

    pub fn sync_zone(&mut self, zone: ZoneId) {
        self.queue.push(Command::SyncZone(zone));
    }

    pub fn remove_entity(&mut self, handle: EntityHandle) {
        self.queue.push(Command::RemoveEntity(handle));
    }

    pub fn set_observer_enabled(&mut self, observer: ObserverId, enabled: bool) {
        self.queue.push(Command::SetObserverEnabled(observer, enabled));
    }

    pub(crate) fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }
}
