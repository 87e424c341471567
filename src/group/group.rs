//! Entity groups: contiguous storage and per-tick scheduling state
//!
//! A group holds entities that share an update rate and movement threshold.
//! Storage is struct-of-arrays with swap-with-last removal, so the arrays
//! never have holes and the scheduler can walk them by index.

use std::collections::HashMap;
use std::fmt;

use crate::core::types::{Metadata, Vec3};
use crate::core::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Engine-wide stable entity identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Opaque host handle for an entity; the host's own key
pub type EntityHandle = u64;

/// Position probe supplied by the host for each entity
pub type PositionProbe = Box<dyn FnMut() -> Vec3>;

/// Sentinel for "never probed"
pub(crate) const NEVER: u64 = u64::MAX;

/// Scheduling parameters shared by every entity in a group
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct GroupConfig {
    /// Queries per entity per second
    pub update_rate: f32,
    /// Movement threshold in world units below which a query is skipped
    pub precision: f32,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            update_rate: 30.0,
            precision: 0.0,
        }
    }
}

impl GroupConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.update_rate.is_finite() || self.update_rate <= 0.0 {
            return Err(Error::invalid("update_rate must be positive and finite"));
        }
        if !self.precision.is_finite() || self.precision < 0.0 {
            return Err(Error::invalid("precision must be non-negative and finite"));
        }
        Ok(())
    }
}

/// How a group's membership is managed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupRole {
    /// Host adds and removes entities explicitly
    Plain,
    /// Auto-populated from host player join/leave notifications
    Players,
    /// Single entity tracking the local participant across respawns
    LocalPlayer,
}

/// A homogeneously-scheduled set of entities
pub struct Group {
    pub(crate) id: GroupId,
    pub(crate) role: GroupRole,
    pub(crate) rate: f32,
    /// Stored squared so the filter compares squared distances
    pub(crate) precision_sq: f32,
    pub(crate) ids: Vec<EntityId>,
    pub(crate) handles: Vec<EntityHandle>,
    pub(crate) probes: Vec<PositionProbe>,
    pub(crate) last_pos: Vec<Vec3>,
    pub(crate) last_tick: Vec<u64>,
    pub(crate) metadata: Vec<Option<Metadata>>,
    index_of: HashMap<EntityId, usize>,
    /// Round-robin cursor into the entity arrays
    pub(crate) cursor: usize,
    /// Number of observers subscribed to this group
    pub(crate) subscribers: u32,
    /// Remaining quota for the tick being scheduled
    pub(crate) quota: u32,
}

impl Group {
    pub(crate) fn new(id: GroupId, role: GroupRole, config: GroupConfig) -> Self {
        Self {
            id,
            role,
            rate: config.update_rate,
            precision_sq: config.precision * config.precision,
            ids: Vec::new(),
            handles: Vec::new(),
            probes: Vec::new(),
            last_pos: Vec::new(),
            last_tick: Vec::new(),
            metadata: Vec::new(),
            index_of: HashMap::new(),
            cursor: 0,
            subscribers: 0,
            quota: 0,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn role(&self) -> GroupRole {
        self.role
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(crate) fn contains(&self, id: EntityId) -> bool {
        self.index_of.contains_key(&id)
    }

    pub(crate) fn index_of(&self, id: EntityId) -> Option<usize> {
        self.index_of.get(&id).copied()
    }

    pub(crate) fn add(
        &mut self,
        id: EntityId,
        handle: EntityHandle,
        probe: PositionProbe,
        metadata: Option<Metadata>,
    ) -> usize {
        let index = self.ids.len();
        self.ids.push(id);
        self.handles.push(handle);
        self.probes.push(probe);
        self.last_pos.push(Vec3::ZERO);
        self.last_tick.push(NEVER);
        self.metadata.push(metadata);
        self.index_of.insert(id, index);
        index
    }

    /// Swap-with-last removal; O(1), keeps the arrays hole-free
    pub(crate) fn remove(&mut self, id: EntityId) -> Option<EntityHandle> {
        let index = self.index_of.remove(&id)?;
        let last = self.ids.len() - 1;
        self.ids.swap(index, last);
        self.handles.swap(index, last);
        self.probes.swap(index, last);
        self.last_pos.swap(index, last);
        self.last_tick.swap(index, last);
        self.metadata.swap(index, last);

        let handle = self.handles.pop().unwrap_or_default();
        self.ids.pop();
        self.probes.pop();
        self.last_pos.pop();
        self.last_tick.pop();
        self.metadata.pop();

        if index < self.ids.len() {
            self.index_of.insert(self.ids[index], index);
        }
        if self.cursor >= self.ids.len() {
            self.cursor = 0;
        }
        Some(handle)
    }

    /// Entity updates owed for a tick of length `dt` seconds
    pub(crate) fn quota_for(&self, dt: f64) -> u32 {
        if self.ids.is_empty() {
            return 0;
        }
        (self.ids.len() as f64 * self.rate as f64 * dt).ceil() as u32
    }

    /// Advance the round-robin cursor and return the index to process
    pub(crate) fn next_index(&mut self) -> Option<usize> {
        if self.ids.is_empty() {
            return None;
        }
        let index = self.cursor % self.ids.len();
        self.cursor = (index + 1) % self.ids.len();
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_at(p: Vec3) -> PositionProbe {
        Box::new(move || p)
    }

    fn group() -> Group {
        Group::new(GroupId(0), GroupRole::Plain, GroupConfig::default())
    }

    #[test]
    fn test_config_validation() {
        assert!(GroupConfig::default().validate().is_ok());
        assert!(GroupConfig { update_rate: 0.0, precision: 0.0 }.validate().is_err());
        assert!(GroupConfig { update_rate: -5.0, precision: 0.0 }.validate().is_err());
        assert!(GroupConfig { update_rate: 30.0, precision: -1.0 }.validate().is_err());
        assert!(GroupConfig { update_rate: f32::NAN, precision: 0.0 }.validate().is_err());
    }

    #[test]
    fn test_add_and_lookup() {
        let mut g = group();
        g.add(EntityId(1), 101, probe_at(Vec3::ZERO), None);
        g.add(EntityId(2), 102, probe_at(Vec3::ONE), None);

        assert_eq!(g.len(), 2);
        assert_eq!(g.index_of(EntityId(2)), Some(1));
        assert!(g.contains(EntityId(1)));
        assert!(!g.contains(EntityId(3)));
    }

    #[test]
    fn test_swap_remove_keeps_arrays_dense() {
        let mut g = group();
        g.add(EntityId(1), 101, probe_at(Vec3::ZERO), None);
        g.add(EntityId(2), 102, probe_at(Vec3::ZERO), None);
        g.add(EntityId(3), 103, probe_at(Vec3::ZERO), None);

        assert_eq!(g.remove(EntityId(1)), Some(101));
        assert_eq!(g.len(), 2);
        // The last entity moved into the vacated slot
        assert_eq!(g.ids[0], EntityId(3));
        assert_eq!(g.index_of(EntityId(3)), Some(0));
        assert_eq!(g.index_of(EntityId(2)), Some(1));

        assert_eq!(g.remove(EntityId(9)), None);
    }

    #[test]
    fn test_quota_math() {
        let mut g = group(); // 30 Hz
        assert_eq!(g.quota_for(1.0 / 60.0), 0); // empty group
        for i in 0..10 {
            g.add(EntityId(i), i, probe_at(Vec3::ZERO), None);
        }
        // 10 entities * 30 Hz * 0.017 s = 5.1, rounded up
        assert_eq!(g.quota_for(0.017), 6);
        // Fractional quotas round up
        assert_eq!(g.quota_for(0.001), 1);
    }

    #[test]
    fn test_cursor_wraps() {
        let mut g = group();
        for i in 0..3 {
            g.add(EntityId(i), i, probe_at(Vec3::ZERO), None);
        }
        let order: Vec<usize> = (0..7).filter_map(|_| g.next_index()).collect();
        assert_eq!(order, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_cursor_survives_removal() {
        let mut g = group();
        for i in 0..3 {
            g.add(EntityId(i), i, probe_at(Vec3::ZERO), None);
        }
        g.next_index();
        g.next_index(); // cursor now 2
        g.remove(EntityId(2));
        g.remove(EntityId(0));
        // Cursor clamped back into range
        assert_eq!(g.next_index(), Some(0));
    }
}
