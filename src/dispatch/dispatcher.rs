//! Enter/exit transitions and synchronous event delivery
//!
//! The dispatcher advances (observer, entity) state as entities are
//! processed, queueing events in observation order. The queue drains at the
//! end of the tick: callbacks run synchronously on the scheduler thread with
//! a `Commands` buffer for anything they want changed. A panicking callback
//! or cleanup is caught, logged, and suppressed; the state machine has
//! already advanced by the time callbacks run.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::core::types::Metadata;
use crate::group::{EntityHandle, EntityId, Group, GroupId, GroupRole};
use crate::observer::observer::{InsideEntry, Occupancy};
use crate::observer::{Observer, ObserverId};
use crate::zone::ZoneId;
use super::commands::Commands;
use super::events::{Cleanup, GroupEvent, ZoneEvent};

enum QueuedEvent {
    Entered {
        observer: ObserverId,
        event: ZoneEvent,
    },
    Exited {
        observer: ObserverId,
        event: ZoneEvent,
        cleanups: Vec<Cleanup>,
    },
    GroupEntered {
        observer: ObserverId,
        event: GroupEvent,
    },
    GroupExited {
        observer: ObserverId,
        event: GroupEvent,
        cleanups: Vec<Cleanup>,
    },
}

/// Queues transitions as they are observed and delivers them at the drain
#[derive(Default)]
pub struct Dispatcher {
    queue: Vec<QueuedEvent>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self { queue: Vec::new() }
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Advance one (observer, entity) pair to the observed winning zone
    ///
    /// `winner` is the zone that won priority resolution for this observer,
    /// with its metadata, or None when the entity is outside every attached
    /// zone. Equal prior and winner states are a no-op.
    pub(crate) fn transition(
        &mut self,
        observer: &mut Observer,
        entity: EntityId,
        handle: EntityHandle,
        group: GroupId,
        entity_metadata: Option<Metadata>,
        winner: Option<(ZoneId, Option<Metadata>)>,
    ) {
        let prior = observer.inside.get(&entity).map(|entry| entry.zone);
        if prior == winner.as_ref().map(|w| w.0) {
            return;
        }

        if prior.is_some() {
            self.exit_current(observer, entity);
        }

        if let Some((zone, zone_metadata)) = winner {
            observer.inside.insert(
                entity,
                InsideEntry {
                    zone,
                    group,
                    handle,
                    zone_metadata: zone_metadata.clone(),
                    entity_metadata: entity_metadata.clone(),
                    cleanups: Vec::new(),
                },
            );
            self.queue.push(QueuedEvent::Entered {
                observer: observer.id,
                event: ZoneEvent {
                    entity,
                    handle,
                    group,
                    zone,
                    zone_metadata,
                    entity_metadata,
                },
            });

            let occupancy = observer.occupancy.entry((group, zone)).or_insert_with(Occupancy::default);
            occupancy.count += 1;
            if occupancy.count == 1 {
                self.queue.push(QueuedEvent::GroupEntered {
                    observer: observer.id,
                    event: GroupEvent { group, zone },
                });
            }
        }
    }

    /// Exit path shared by regular transitions and synthetic exits
    pub(crate) fn exit_current(&mut self, observer: &mut Observer, entity: EntityId) {
        let Some(entry) = observer.inside.remove(&entity) else {
            return;
        };
        self.queue.push(QueuedEvent::Exited {
            observer: observer.id,
            event: ZoneEvent {
                entity,
                handle: entry.handle,
                group: entry.group,
                zone: entry.zone,
                zone_metadata: entry.zone_metadata,
                entity_metadata: entry.entity_metadata,
            },
            cleanups: entry.cleanups,
        });

        let key = (entry.group, entry.zone);
        if let Some(occupancy) = observer.occupancy.get_mut(&key) {
            occupancy.count -= 1;
            if occupancy.count == 0 {
                let occupancy = observer.occupancy.remove(&key).unwrap_or_default();
                self.queue.push(QueuedEvent::GroupExited {
                    observer: observer.id,
                    event: GroupEvent { group: key.0, zone: key.1 },
                    cleanups: occupancy.cleanups,
                });
            }
        }
    }

    /// Synthetic exits for every entity inside `zone` (zone destruction)
    pub(crate) fn exit_zone(&mut self, observer: &mut Observer, zone: ZoneId) {
        let mut entities: Vec<EntityId> = observer
            .inside
            .iter()
            .filter(|(_, entry)| entry.zone == zone)
            .map(|(id, _)| *id)
            .collect();
        entities.sort();
        for entity in entities {
            self.exit_current(observer, entity);
        }
    }

    /// Synthetic exits for everything (observer disable)
    pub(crate) fn exit_all(&mut self, observer: &mut Observer) {
        let mut entities: Vec<EntityId> = observer.inside.keys().copied().collect();
        entities.sort();
        for entity in entities {
            self.exit_current(observer, entity);
        }
    }

    /// Deliver all queued events in observation order
    ///
    /// `observers` must be indexed by observer id and `groups` by group id;
    /// both arenas only ever grow.
    pub(crate) fn drain(
        &mut self,
        observers: &mut [Observer],
        groups: &[Group],
        commands: &mut Commands,
    ) {
        let events = std::mem::take(&mut self.queue);
        for queued in events {
            match queued {
                QueuedEvent::Entered { observer, event } => {
                    let role = groups[event.group.0 as usize].role;
                    let obs = &mut observers[observer.0 as usize];

                    for cb in obs.callbacks.entered.iter_mut() {
                        guard("on_entered", || cb(&event, commands));
                    }
                    let mut cleanups: Vec<Cleanup> = Vec::new();
                    for cb in obs.callbacks.observe.iter_mut() {
                        if let Some(cleanup) = guard_observe("observe", || cb(&event, commands)) {
                            cleanups.push(cleanup);
                        }
                    }
                    if role == GroupRole::Players {
                        for cb in obs.callbacks.player_entered.iter_mut() {
                            guard("on_player_entered", || cb(&event, commands));
                        }
                        for cb in obs.callbacks.observe_player.iter_mut() {
                            if let Some(cleanup) = guard_observe("observe_player", || cb(&event, commands)) {
                                cleanups.push(cleanup);
                            }
                        }
                    }
                    if role == GroupRole::LocalPlayer {
                        for cb in obs.callbacks.local_player_entered.iter_mut() {
                            guard("on_local_player_entered", || cb(&event, commands));
                        }
                        for cb in obs.callbacks.observe_local_player.iter_mut() {
                            if let Some(cleanup) =
                                guard_observe("observe_local_player", || cb(&event, commands))
                            {
                                cleanups.push(cleanup);
                            }
                        }
                    }

                    // Attach collected cleanups to the live INSIDE entry; a
                    // same-tick synthetic exit cannot have removed it because
                    // state only changes between drains.
                    if !cleanups.is_empty() {
                        if let Some(entry) = obs.inside.get_mut(&event.entity) {
                            if entry.zone == event.zone {
                                entry.cleanups.append(&mut cleanups);
                            }
                        }
                    }
                }
                QueuedEvent::Exited { observer, event, cleanups } => {
                    let role = groups[event.group.0 as usize].role;
                    let obs = &mut observers[observer.0 as usize];

                    for cb in obs.callbacks.exited.iter_mut() {
                        guard("on_exited", || cb(&event, commands));
                    }
                    if role == GroupRole::Players {
                        for cb in obs.callbacks.player_exited.iter_mut() {
                            guard("on_player_exited", || cb(&event, commands));
                        }
                    }
                    if role == GroupRole::LocalPlayer {
                        for cb in obs.callbacks.local_player_exited.iter_mut() {
                            guard("on_local_player_exited", || cb(&event, commands));
                        }
                    }
                    for cleanup in cleanups {
                        guard("cleanup", || cleanup(commands));
                    }
                }
                QueuedEvent::GroupEntered { observer, event } => {
                    let obs = &mut observers[observer.0 as usize];
                    for cb in obs.callbacks.group_entered.iter_mut() {
                        guard("on_group_entered", || cb(&event, commands));
                    }
                    let mut cleanups: Vec<Cleanup> = Vec::new();
                    for cb in obs.callbacks.observe_group.iter_mut() {
                        if let Some(cleanup) = guard_observe("observe_group", || cb(&event, commands)) {
                            cleanups.push(cleanup);
                        }
                    }
                    if !cleanups.is_empty() {
                        if let Some(occupancy) = obs.occupancy.get_mut(&(event.group, event.zone)) {
                            occupancy.cleanups.append(&mut cleanups);
                        }
                    }
                }
                QueuedEvent::GroupExited { observer, event, cleanups } => {
                    let obs = &mut observers[observer.0 as usize];
                    for cb in obs.callbacks.group_exited.iter_mut() {
                        guard("on_group_exited", || cb(&event, commands));
                    }
                    for cleanup in cleanups {
                        guard("group cleanup", || cleanup(commands));
                    }
                }
            }
        }
    }
}

fn guard(what: &str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        log::error!("{what} callback panicked; suppressed");
    }
}

fn guard_observe(what: &str, f: impl FnOnce() -> Option<Cleanup>) -> Option<Cleanup> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(cleanup) => cleanup,
        Err(_) => {
            log::error!("{what} callback panicked; suppressed");
            None
        }
    }
}
