//! Observers: the logic layer binding groups to zones
//!
//! An observer subscribes to groups (whose entities it watches) and has
//! zones attached to it (the volumes it cares about). For every watched
//! entity it tracks at most one winning zone; the dispatcher drives the
//! OUTSIDE <-> INSIDE(zone) transitions.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::core::types::Metadata;
use crate::dispatch::{Cleanup, CallbackRegistry};
use crate::group::{EntityHandle, EntityId, GroupId};
use crate::zone::ZoneId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u32);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// Construction parameters for an observer
#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ObserverConfig {
    /// Orders event emission between observers; higher fires first
    pub priority: i32,
}

/// Per-entity INSIDE state
pub(crate) struct InsideEntry {
    pub zone: ZoneId,
    pub group: GroupId,
    pub handle: EntityHandle,
    /// Zone metadata captured at enter time, so exits after the zone is
    /// destroyed still carry it
    pub zone_metadata: Option<Metadata>,
    pub entity_metadata: Option<Metadata>,
    /// Cleanups returned by observe-style callbacks; run at the exit
    pub cleanups: Vec<Cleanup>,
}

/// Per (group, zone) occupancy under one observer
#[derive(Default)]
pub(crate) struct Occupancy {
    pub count: u32,
    pub cleanups: Vec<Cleanup>,
}

pub struct Observer {
    pub(crate) id: ObserverId,
    pub(crate) priority: i32,
    pub(crate) enabled: bool,
    /// Groups whose entities this observer watches
    pub(crate) groups: HashSet<GroupId>,
    /// Zones attached to this observer
    pub(crate) zones: HashSet<ZoneId>,
    pub(crate) callbacks: CallbackRegistry,
    /// Winning zone per entity; an entry exists iff the entity is INSIDE
    pub(crate) inside: HashMap<EntityId, InsideEntry>,
    /// Occupancy counters driving the group-level events
    pub(crate) occupancy: HashMap<(GroupId, ZoneId), Occupancy>,
}

impl Observer {
    pub(crate) fn new(id: ObserverId, config: ObserverConfig) -> Self {
        Self {
            id,
            priority: config.priority,
            enabled: true,
            groups: HashSet::new(),
            zones: HashSet::new(),
            callbacks: CallbackRegistry::default(),
            inside: HashMap::new(),
            occupancy: HashMap::new(),
        }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn subscribes_to(&self, group: GroupId) -> bool {
        self.groups.contains(&group)
    }

    pub fn is_attached(&self, zone: ZoneId) -> bool {
        self.zones.contains(&zone)
    }

    /// Winning zone among containment candidates
    ///
    /// Attached zones share this observer's priority, so the deterministic
    /// tie-break is the lowest zone id.
    pub(crate) fn winner(&self, candidates: &[ZoneId]) -> Option<ZoneId> {
        candidates
            .iter()
            .copied()
            .filter(|z| self.zones.contains(z))
            .min()
    }

    /// Zone the entity is currently inside under this observer, if any
    pub fn zone_of(&self, entity: EntityId) -> Option<ZoneId> {
        self.inside.get(&entity).map(|entry| entry.zone)
    }
}
