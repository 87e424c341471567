//! Engine facade: owns every store and runs the scheduler
//!
//! Single-threaded cooperative: the host calls `tick()` from its simulation
//! loop and the engine does a bounded amount of work — flush pending zone
//! mutations (at most one tree action per tree), hand out entity updates
//! round-robin across groups until the wall-clock budget expires, then
//! deliver queued events and apply deferred commands.
//!
//! Everything is arena-indexed: zones, groups, and observers refer to each
//! other by id, never by owning pointers, so destruction is an explicit walk
//! over the id sets.

use std::collections::HashMap;
use std::rc::Rc;

use crate::core::time::{Clock, MonotonicClock, TickStats, TickTimer};
use crate::core::types::{Metadata, Vec3};
use crate::core::{Error, Result};
use crate::dispatch::commands::Command;
use crate::dispatch::{Cleanup, Commands, Dispatcher, GroupEvent, ZoneEvent};
use crate::group::group::NEVER;
use crate::group::{
    EntityHandle, EntityId, Group, GroupConfig, GroupId, GroupRole, PositionProbe,
};
use crate::observer::{Observer, ObserverConfig, ObserverId};
use crate::schedule::{clamp_dt, TickBudget};
use crate::zone::{FlushReport, Zone, ZoneConfig, ZoneId, ZoneSource, ZoneStore};

/// Engine-wide configuration
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Per-tick wall-clock budget in milliseconds
    pub frame_budget_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { frame_budget_ms: 1.0 }
    }
}

/// Preallocated per-tick buffers; steady-state ticks do not allocate
#[derive(Default)]
struct QueryScratch {
    stack: Vec<u32>,
    hits: Vec<ZoneId>,
    contained: Vec<ZoneId>,
    observer_order: Vec<u32>,
    /// Per-group movement-filter bypass for the current tick
    bypass: Vec<bool>,
}

/// The spatial-containment engine
///
/// Multiple instances are allowed; nothing here is process-global.
pub struct Engine {
    clock: Box<dyn Clock>,
    budget: TickBudget,
    zones: ZoneStore,
    groups: Vec<Group>,
    observers: Vec<Observer>,
    dispatcher: Dispatcher,
    commands: Commands,
    /// Host handle to (group, entity); an entity belongs to one group
    handles: HashMap<EntityHandle, (GroupId, EntityId)>,
    next_entity_id: u64,
    tick_number: u64,
    last_tick_at: Option<f64>,
    /// Group the round-robin resumes from next tick
    rr_group: usize,
    players: Option<GroupId>,
    local_player: Option<GroupId>,
    local_player_handle: Option<EntityHandle>,
    /// Groups whose movement filter must be bypassed on the next tick
    /// because their observers' interest set changed structurally
    pending_bypass: Vec<GroupId>,
    timer: TickTimer,
    scratch: QueryScratch,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_clock(config, Box::new(MonotonicClock::new()))
    }

    /// Construct with an explicit clock; tests drive time by hand
    pub fn with_clock(config: EngineConfig, clock: Box<dyn Clock>) -> Result<Self> {
        if !config.frame_budget_ms.is_finite() || config.frame_budget_ms <= 0.0 {
            return Err(Error::invalid("frame budget must be positive and finite"));
        }
        Ok(Self {
            clock,
            budget: TickBudget::new(config.frame_budget_ms),
            zones: ZoneStore::new(),
            groups: Vec::new(),
            observers: Vec::new(),
            dispatcher: Dispatcher::new(),
            commands: Commands::new(),
            handles: HashMap::new(),
            next_entity_id: 0,
            tick_number: 0,
            last_tick_at: None,
            rr_group: 0,
            players: None,
            local_player: None,
            local_player_handle: None,
            pending_bypass: Vec::new(),
            timer: TickTimer::default(),
            scratch: QueryScratch::default(),
        })
    }

    // --- Budget knob ---

    pub fn frame_budget_ms(&self) -> f64 {
        self.budget.budget_ms()
    }

    pub fn set_frame_budget_ms(&mut self, budget_ms: f64) -> Result<()> {
        if !budget_ms.is_finite() || budget_ms <= 0.0 {
            return Err(Error::invalid("frame budget must be positive and finite"));
        }
        self.budget.set_budget_ms(budget_ms);
        Ok(())
    }

    // --- Groups ---

    pub fn create_group(&mut self, config: GroupConfig) -> Result<GroupId> {
        config.validate()?;
        Ok(self.push_group(config, GroupRole::Plain))
    }

    /// Group auto-populated from host player join/leave notifications
    pub fn players_group(&mut self) -> GroupId {
        if let Some(id) = self.players {
            return id;
        }
        let id = self.push_group(GroupConfig::default(), GroupRole::Players);
        self.players = Some(id);
        id
    }

    /// Group holding the single local participant, tracking respawns
    pub fn local_player_group(&mut self) -> GroupId {
        if let Some(id) = self.local_player {
            return id;
        }
        let id = self.push_group(GroupConfig::default(), GroupRole::LocalPlayer);
        self.local_player = Some(id);
        id
    }

    fn push_group(&mut self, config: GroupConfig, role: GroupRole) -> GroupId {
        let id = GroupId(self.groups.len() as u32);
        self.groups.push(Group::new(id, role, config));
        id
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0 as usize)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    // --- Entities ---

    pub fn add_entity(
        &mut self,
        group: GroupId,
        handle: EntityHandle,
        probe: PositionProbe,
        metadata: Option<Metadata>,
    ) -> Result<EntityId> {
        if self.handles.contains_key(&handle) {
            return Err(Error::invalid(format!(
                "handle {handle} is already tracked; an entity belongs to one group"
            )));
        }
        let Some(g) = self.groups.get_mut(group.0 as usize) else {
            return Err(Error::lifecycle(format!("{group} does not exist")));
        };
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        g.add(id, handle, probe, metadata);
        self.handles.insert(handle, (group, id));
        Ok(id)
    }

    pub fn add_entities(
        &mut self,
        group: GroupId,
        entries: impl IntoIterator<Item = (EntityHandle, PositionProbe)>,
    ) -> Result<Vec<EntityId>> {
        let mut ids = Vec::new();
        for (handle, probe) in entries {
            ids.push(self.add_entity(group, handle, probe, None)?);
        }
        Ok(ids)
    }

    /// Remove an entity; synthetic exits fire for every observer that
    /// currently records it inside a zone
    pub fn remove_entity(&mut self, handle: EntityHandle) -> Result<()> {
        self.remove_entity_inner(handle)?;
        self.settle();
        Ok(())
    }

    pub fn remove_entities(
        &mut self,
        handles: impl IntoIterator<Item = EntityHandle>,
    ) -> Result<()> {
        for handle in handles {
            self.remove_entity_inner(handle)?;
        }
        self.settle();
        Ok(())
    }

    fn remove_entity_inner(&mut self, handle: EntityHandle) -> Result<()> {
        let Some((group, entity)) = self.handles.remove(&handle) else {
            return Err(Error::lifecycle(format!("handle {handle} is not tracked")));
        };
        for observer in self.observers.iter_mut() {
            self.dispatcher.exit_current(observer, entity);
        }
        self.groups[group.0 as usize].remove(entity);
        Ok(())
    }

    pub fn group_of_entity(&self, handle: EntityHandle) -> Option<GroupId> {
        self.handles.get(&handle).map(|(group, _)| *group)
    }

    pub fn entity_count(&self) -> usize {
        self.handles.len()
    }

    // --- Player lifecycle notifications ---

    pub fn player_joined(&mut self, handle: EntityHandle, probe: PositionProbe) -> Result<EntityId> {
        let group = self.players_group();
        self.add_entity(group, handle, probe, None)
    }

    pub fn player_left(&mut self, handle: EntityHandle) -> Result<()> {
        let players = self.players_group();
        if self.group_of_entity(handle) != Some(players) {
            return Err(Error::lifecycle(format!("handle {handle} is not a tracked player")));
        }
        self.remove_entity(handle)
    }

    /// A respawn replaces the previous local-player entity
    pub fn local_player_spawned(
        &mut self,
        handle: EntityHandle,
        probe: PositionProbe,
    ) -> Result<EntityId> {
        let group = self.local_player_group();
        if let Some(previous) = self.local_player_handle.take() {
            if self.handles.contains_key(&previous) {
                self.remove_entity(previous)?;
            }
        }
        let id = self.add_entity(group, handle, probe, None)?;
        self.local_player_handle = Some(handle);
        Ok(id)
    }

    pub fn local_player_despawned(&mut self) -> Result<()> {
        let Some(handle) = self.local_player_handle.take() else {
            return Err(Error::lifecycle("no local player is tracked"));
        };
        self.remove_entity(handle)
    }

    // --- Observers ---

    pub fn create_observer(&mut self, config: ObserverConfig) -> ObserverId {
        let id = ObserverId(self.observers.len() as u32);
        self.observers.push(Observer::new(id, config));
        id
    }

    pub fn observer(&self, id: ObserverId) -> Option<&Observer> {
        self.observers.get(id.0 as usize)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn subscribe(&mut self, observer: ObserverId, group: GroupId) -> Result<()> {
        if self.groups.get(group.0 as usize).is_none() {
            return Err(Error::lifecycle(format!("{group} does not exist")));
        }
        let Some(obs) = self.observers.get_mut(observer.0 as usize) else {
            return Err(Error::lifecycle(format!("{observer} does not exist")));
        };
        if obs.groups.insert(group) {
            self.groups[group.0 as usize].subscribers += 1;
            // Stationary entities must still be re-queried under the new
            // subscription
            self.pending_bypass.push(group);
        }
        Ok(())
    }

    /// Disabling synthesizes exits for every pair currently inside;
    /// re-enabling starts from OUTSIDE and re-enters on the next tick
    pub fn set_observer_enabled(&mut self, observer: ObserverId, enabled: bool) -> Result<()> {
        self.set_observer_enabled_inner(observer, enabled)?;
        self.settle();
        Ok(())
    }

    fn set_observer_enabled_inner(&mut self, observer: ObserverId, enabled: bool) -> Result<()> {
        let Some(obs) = self.observers.get_mut(observer.0 as usize) else {
            return Err(Error::lifecycle(format!("{observer} does not exist")));
        };
        if obs.enabled && !enabled {
            obs.enabled = false;
            self.dispatcher.exit_all(obs);
        } else if !obs.enabled && enabled {
            obs.enabled = true;
            // Everything starts OUTSIDE; force the next tick to re-query
            // even entities that have not moved
            self.pending_bypass.extend(obs.groups.iter().copied());
        }
        Ok(())
    }

    // --- Zones ---

    pub fn create_zone(&mut self, config: ZoneConfig) -> Result<ZoneId> {
        self.zones.create(config)
    }

    pub fn zone_from_source(
        &mut self,
        source: Rc<dyn ZoneSource>,
        dynamic: bool,
        metadata: Option<Metadata>,
    ) -> Result<ZoneId> {
        self.zones.create_from_source(source, dynamic, metadata)
    }

    pub fn zones_from_sources(
        &mut self,
        sources: impl IntoIterator<Item = Rc<dyn ZoneSource>>,
        dynamic: bool,
    ) -> Result<Vec<ZoneId>> {
        let mut ids = Vec::new();
        for source in sources {
            ids.push(self.zones.create_from_source(source, dynamic, None)?);
        }
        Ok(ids)
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(id)
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    pub fn attach(&mut self, zone: ZoneId, observer: ObserverId) -> Result<()> {
        if self.zones.is_pending_removal(zone) {
            return Err(Error::lifecycle(format!("{zone} is destroyed")));
        }
        if self.observers.get(observer.0 as usize).is_none() {
            return Err(Error::lifecycle(format!("{observer} does not exist")));
        }
        let Some(z) = self.zones.get_mut(zone) else {
            return Err(Error::lifecycle(format!("{zone} does not exist")));
        };
        z.observers.insert(observer);
        let obs = &mut self.observers[observer.0 as usize];
        if obs.zones.insert(zone) {
            self.pending_bypass.extend(obs.groups.iter().copied());
        }
        Ok(())
    }

    pub fn set_zone_position(&mut self, zone: ZoneId, position: Vec3) -> Result<()> {
        self.zones.set_position(zone, position)
    }

    pub fn set_zone_size(&mut self, zone: ZoneId, size: Vec3) -> Result<()> {
        self.zones.set_size(zone, size)
    }

    pub fn sync_zone(&mut self, zone: ZoneId) -> Result<()> {
        self.zones.sync_to_source(zone)
    }

    /// Queue a zone for destruction; its synthetic exits fire at the next
    /// tick boundary, before the trees rebuild
    pub fn destroy_zone(&mut self, zone: ZoneId) -> Result<()> {
        self.zones.destroy(zone)
    }

    // --- Callback registration ---

    pub fn on_entered(
        &mut self,
        observer: ObserverId,
        cb: impl FnMut(&ZoneEvent, &mut Commands) + 'static,
    ) -> Result<()> {
        self.callbacks_mut(observer)?.entered.push(Box::new(cb));
        Ok(())
    }

    pub fn on_exited(
        &mut self,
        observer: ObserverId,
        cb: impl FnMut(&ZoneEvent, &mut Commands) + 'static,
    ) -> Result<()> {
        self.callbacks_mut(observer)?.exited.push(Box::new(cb));
        Ok(())
    }

    pub fn on_group_entered(
        &mut self,
        observer: ObserverId,
        cb: impl FnMut(&GroupEvent, &mut Commands) + 'static,
    ) -> Result<()> {
        self.callbacks_mut(observer)?.group_entered.push(Box::new(cb));
        Ok(())
    }

    pub fn on_group_exited(
        &mut self,
        observer: ObserverId,
        cb: impl FnMut(&GroupEvent, &mut Commands) + 'static,
    ) -> Result<()> {
        self.callbacks_mut(observer)?.group_exited.push(Box::new(cb));
        Ok(())
    }

    pub fn on_player_entered(
        &mut self,
        observer: ObserverId,
        cb: impl FnMut(&ZoneEvent, &mut Commands) + 'static,
    ) -> Result<()> {
        self.callbacks_mut(observer)?.player_entered.push(Box::new(cb));
        Ok(())
    }

    pub fn on_player_exited(
        &mut self,
        observer: ObserverId,
        cb: impl FnMut(&ZoneEvent, &mut Commands) + 'static,
    ) -> Result<()> {
        self.callbacks_mut(observer)?.player_exited.push(Box::new(cb));
        Ok(())
    }

    pub fn on_local_player_entered(
        &mut self,
        observer: ObserverId,
        cb: impl FnMut(&ZoneEvent, &mut Commands) + 'static,
    ) -> Result<()> {
        self.callbacks_mut(observer)?.local_player_entered.push(Box::new(cb));
        Ok(())
    }

    pub fn on_local_player_exited(
        &mut self,
        observer: ObserverId,
        cb: impl FnMut(&ZoneEvent, &mut Commands) + 'static,
    ) -> Result<()> {
        self.callbacks_mut(observer)?.local_player_exited.push(Box::new(cb));
        Ok(())
    }

    /// Like `on_entered`, but the callback may return a cleanup that runs
    /// exactly once at the matching exit
    pub fn observe(
        &mut self,
        observer: ObserverId,
        cb: impl FnMut(&ZoneEvent, &mut Commands) -> Option<Cleanup> + 'static,
    ) -> Result<()> {
        self.callbacks_mut(observer)?.observe.push(Box::new(cb));
        Ok(())
    }

    pub fn observe_group(
        &mut self,
        observer: ObserverId,
        cb: impl FnMut(&GroupEvent, &mut Commands) -> Option<Cleanup> + 'static,
    ) -> Result<()> {
        self.callbacks_mut(observer)?.observe_group.push(Box::new(cb));
        Ok(())
    }

    pub fn observe_player(
        &mut self,
        observer: ObserverId,
        cb: impl FnMut(&ZoneEvent, &mut Commands) -> Option<Cleanup> + 'static,
    ) -> Result<()> {
        self.callbacks_mut(observer)?.observe_player.push(Box::new(cb));
        Ok(())
    }

    pub fn observe_local_player(
        &mut self,
        observer: ObserverId,
        cb: impl FnMut(&ZoneEvent, &mut Commands) -> Option<Cleanup> + 'static,
    ) -> Result<()> {
        self.callbacks_mut(observer)?.observe_local_player.push(Box::new(cb));
        Ok(())
    }

    fn callbacks_mut(&mut self, observer: ObserverId) -> Result<&mut crate::dispatch::CallbackRegistry> {
        match self.observers.get_mut(observer.0 as usize) {
            Some(obs) => Ok(&mut obs.callbacks),
            None => Err(Error::lifecycle(format!("{observer} does not exist"))),
        }
    }

    // --- Immediate queries ---

    /// Zones exactly containing `p`, ascending by id
    ///
    /// Runs a fresh stabbing query against both trees plus the exact
    /// point-in-shape filter; scheduling state is untouched.
    pub fn zones_at_point(&self, p: Vec3) -> Vec<ZoneId> {
        let mut stack = Vec::with_capacity(64);
        let mut hits = Vec::new();
        self.zones.static_tree().stab(p, &mut stack, &mut hits);
        self.zones.dynamic_tree().stab(p, &mut stack, &mut hits);
        let mut out: Vec<ZoneId> = hits
            .into_iter()
            .filter(|&id| {
                self.zones
                    .get(id)
                    .map_or(false, |zone| zone.contains_point(p))
            })
            .collect();
        out.sort();
        out
    }

    pub fn stats(&self) -> TickStats {
        self.timer.stats()
    }

    // --- The scheduler ---

    /// Run one tick: flush zones, probe entity slices round-robin within the
    /// frame budget, deliver events
    pub fn tick(&mut self) {
        let t0 = self.clock.now();
        self.budget.begin(t0);
        let dt = clamp_dt(self.last_tick_at.map_or(0.0, |prev| t0 - prev));
        self.last_tick_at = Some(t0);
        self.tick_number += 1;

        // Synthetic exits for destroyed zones, before the trees change
        for zone_id in self.zones.pending_removals() {
            for observer in self.observers.iter_mut() {
                if observer.zones.remove(&zone_id) {
                    self.dispatcher.exit_zone(observer, zone_id);
                }
            }
        }

        // Flush is never deferred; queries depend on it
        let report = self.zones.flush();
        self.compute_bypass(&report);

        let mut processed: u32 = 0;
        let now = self.clock.now();
        if self.budget.exhausted(now) {
            log::debug!(
                "tick {}: flush consumed the whole budget; queries skipped",
                self.tick_number
            );
        } else {
            for group in self.groups.iter_mut() {
                group.quota = if group.subscribers > 0 { group.quota_for(dt) } else { 0 };
            }
            processed = self.run_round_robin();
        }

        // Deliver events and apply commands issued by callbacks; dispatch is
        // never preempted mid-drain even if the budget has expired
        self.settle();

        let elapsed = self.budget.spent(self.clock.now());
        self.timer.record(elapsed, processed);
    }

    /// One entity at a time from each group with remaining quota, until the
    /// quotas or the budget run out
    fn run_round_robin(&mut self) -> u32 {
        let group_count = self.groups.len();
        if group_count == 0 {
            return 0;
        }

        let mut processed = 0;
        let mut remaining: u32 = self.groups.iter().map(|g| g.quota).sum();
        let mut idx = self.rr_group % group_count;
        while remaining > 0 {
            let mut hops = 0;
            while self.groups[idx].quota == 0 && hops < group_count {
                idx = (idx + 1) % group_count;
                hops += 1;
            }
            if self.groups[idx].quota == 0 {
                break;
            }
            self.groups[idx].quota -= 1;
            remaining -= 1;

            let current = idx;
            idx = (idx + 1) % group_count;
            self.process_entity(current);
            processed += 1;

            if self.budget.exhausted(self.clock.now()) {
                break;
            }
        }
        self.rr_group = idx;
        processed
    }

    /// Probe one entity, apply the movement filter, query both trees, and
    /// advance every subscribed observer
    fn process_entity(&mut self, group_index: usize) {
        let tick = self.tick_number;
        let bypass = self.scratch.bypass.get(group_index).copied().unwrap_or(false);

        let (entity, handle, group_id, pos, entity_metadata) = {
            let group = &mut self.groups[group_index];
            let Some(index) = group.next_index() else {
                return;
            };
            let pos = (group.probes[index])();
            let entity = group.ids[index];
            if !pos.is_finite() {
                log::warn!("position probe for {entity} returned a non-finite value; skipped");
                return;
            }

            let probed_before = group.last_tick[index] != NEVER;
            if probed_before
                && !bypass
                && pos.distance_squared(group.last_pos[index]) < group.precision_sq
            {
                // Below the movement threshold: keep the prior membership.
                // last_pos stays at the last queried position so slow drift
                // still accumulates toward the threshold.
                return;
            }

            group.last_pos[index] = pos;
            group.last_tick[index] = tick;
            (
                entity,
                group.handles[index],
                group.id,
                pos,
                group.metadata[index].clone(),
            )
        };

        let scratch = &mut self.scratch;
        scratch.hits.clear();
        scratch.contained.clear();
        self.zones.static_tree().stab(pos, &mut scratch.stack, &mut scratch.hits);
        self.zones.dynamic_tree().stab(pos, &mut scratch.stack, &mut scratch.hits);
        for &zone_id in scratch.hits.iter() {
            if let Some(zone) = self.zones.get(zone_id) {
                if zone.contains_point(pos) {
                    scratch.contained.push(zone_id);
                }
            }
        }

        // Observers watching this group, priority descending then id
        scratch.observer_order.clear();
        for observer in self.observers.iter() {
            if observer.enabled && observer.subscribes_to(group_id) {
                scratch.observer_order.push(observer.id().0);
            }
        }
        let observers = &self.observers;
        scratch
            .observer_order
            .sort_by_key(|&id| (std::cmp::Reverse(observers[id as usize].priority), id));

        for &observer_id in scratch.observer_order.iter() {
            let observer = &mut self.observers[observer_id as usize];
            let winner = observer.winner(&scratch.contained).map(|zone_id| {
                let metadata = self.zones.get(zone_id).and_then(|z| z.metadata().cloned());
                (zone_id, metadata)
            });
            self.dispatcher.transition(
                observer,
                entity,
                handle,
                group_id,
                entity_metadata.clone(),
                winner,
            );
        }
    }

    /// The movement filter is skipped for a group when any attached zone of
    /// any of its observers sits in a tree that changed this tick
    fn compute_bypass(&mut self, report: &FlushReport) {
        let scratch = &mut self.scratch;
        scratch.bypass.clear();
        scratch.bypass.resize(self.groups.len(), false);
        for group_id in self.pending_bypass.drain(..) {
            if let Some(flag) = scratch.bypass.get_mut(group_id.0 as usize) {
                *flag = true;
            }
        }
        if !report.static_changed() && !report.dynamic_changed() {
            return;
        }
        for observer in self.observers.iter() {
            if !observer.enabled {
                continue;
            }
            let affected = observer.zones.iter().any(|&zone_id| {
                self.zones.get(zone_id).map_or(false, |zone| {
                    if zone.is_dynamic() {
                        report.dynamic_changed()
                    } else {
                        report.static_changed()
                    }
                })
            });
            if affected {
                for &group_id in observer.groups.iter() {
                    if let Some(flag) = scratch.bypass.get_mut(group_id.0 as usize) {
                        *flag = true;
                    }
                }
            }
        }
    }

    /// Drain the dispatcher and apply deferred commands until both are
    /// quiet. Zone destruction stays pending for the next tick's flush, so
    /// this always terminates unless callbacks keep issuing fresh commands.
    fn settle(&mut self) {
        for _ in 0..64 {
            if self.dispatcher.is_idle() && self.commands.is_empty() {
                return;
            }
            self.dispatcher.drain(&mut self.observers, &self.groups, &mut self.commands);
            for command in self.commands.take() {
                self.apply(command);
            }
        }
        if !self.dispatcher.is_idle() || !self.commands.is_empty() {
            log::error!("dispatch did not settle; remaining work deferred to the next tick");
        }
    }

    fn apply(&mut self, command: Command) {
        let result = match command {
            Command::DestroyZone(id) => self.destroy_zone(id),
            Command::SetZonePosition(id, position) => self.set_zone_position(id, position),
            Command::SyncZone(id) => self.sync_zone(id),
            Command::RemoveEntity(handle) => self.remove_entity_inner(handle),
            Command::SetObserverEnabled(id, enabled) => self.set_observer_enabled_inner(id, enabled),
        };
        if let Err(err) = result {
            log::warn!("deferred command failed: {err}");
        }
    }
}
