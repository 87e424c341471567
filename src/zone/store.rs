//! Zone ownership: static/dynamic partition and per-tick dirty batching
//!
//! Mutations never touch a tree directly. They land in one of three disjoint
//! dirty sets per tree (inserted, mutated, removed) and are applied as a
//! single refit or rebuild when the scheduler flushes the store at the start
//! of a tick.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::bvh::Lbvh;
use crate::core::types::{Metadata, Vec3};
use crate::core::{Error, Result};
use crate::math::Aabb;
use super::zone::{Zone, ZoneConfig, ZoneId, ZoneSource};

/// Pending tree mutations, flushed once per tick
#[derive(Default)]
struct DirtySet {
    inserted: HashSet<ZoneId>,
    mutated: HashSet<ZoneId>,
    removed: HashSet<ZoneId>,
}

impl DirtySet {
    fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.mutated.is_empty() && self.removed.is_empty()
    }

    fn mark_inserted(&mut self, id: ZoneId) {
        self.inserted.insert(id);
    }

    /// No-op when the zone is still pending insertion
    fn mark_mutated(&mut self, id: ZoneId) {
        if !self.inserted.contains(&id) {
            self.mutated.insert(id);
        }
    }

    fn mark_removed(&mut self, id: ZoneId) {
        self.mutated.remove(&id);
        self.removed.insert(id);
    }

    fn clear(&mut self) {
        self.inserted.clear();
        self.mutated.clear();
        self.removed.clear();
    }
}

/// What the flush did to one tree
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeAction {
    None,
    Refit,
    Rebuild,
}

impl TreeAction {
    /// Whether leaf AABBs changed this tick
    pub fn changed(&self) -> bool {
        *self != TreeAction::None
    }
}

/// Result of a per-tick flush
#[derive(Debug, Default)]
pub struct FlushReport {
    pub static_action: Option<TreeAction>,
    pub dynamic_action: Option<TreeAction>,
}

impl FlushReport {
    pub fn static_changed(&self) -> bool {
        self.static_action.map_or(false, |a| a.changed())
    }

    pub fn dynamic_changed(&self) -> bool {
        self.dynamic_action.map_or(false, |a| a.changed())
    }
}

/// Owns every zone and both LBVHs
pub struct ZoneStore {
    zones: HashMap<ZoneId, Zone>,
    next_id: u64,
    static_tree: Lbvh,
    dynamic_tree: Lbvh,
    static_dirty: DirtySet,
    dynamic_dirty: DirtySet,
    /// Reused (id, aabb) buffer for refits and rebuilds
    build_scratch: Vec<(ZoneId, Aabb)>,
}

impl ZoneStore {
    pub fn new() -> Self {
        Self {
            zones: HashMap::new(),
            next_id: 0,
            static_tree: Lbvh::new(),
            dynamic_tree: Lbvh::new(),
            static_dirty: DirtySet::default(),
            dynamic_dirty: DirtySet::default(),
            build_scratch: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn static_tree(&self) -> &Lbvh {
        &self.static_tree
    }

    pub fn dynamic_tree(&self) -> &Lbvh {
        &self.dynamic_tree
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(&id)
    }

    /// Create a zone and queue its insertion into the matching tree
    pub fn create(&mut self, config: ZoneConfig) -> Result<ZoneId> {
        if !config.transform.is_finite() {
            return Err(Error::invalid("zone transform must be finite"));
        }
        if !config.size.is_finite() || config.size.min_element() <= 0.0 {
            return Err(Error::invalid("zone size must be finite and positive"));
        }

        let id = ZoneId(self.next_id);
        self.next_id += 1;

        let mut zone = Zone {
            id,
            shape: config.shape,
            transform: config.transform,
            size: config.size,
            dynamic: config.dynamic,
            aabb: Aabb::default(),
            metadata: config.metadata,
            observers: HashSet::new(),
            source: None,
        };
        zone.recompute_aabb();

        self.dirty_for(config.dynamic).mark_inserted(id);
        self.zones.insert(id, zone);
        Ok(id)
    }

    /// Create a zone derived from a host source, keeping the source handle
    /// so the zone can be re-synced later
    pub fn create_from_source(
        &mut self,
        source: Rc<dyn ZoneSource>,
        dynamic: bool,
        metadata: Option<Metadata>,
    ) -> Result<ZoneId> {
        let mut config = ZoneConfig::new(source.transform(), source.size(), source.shape());
        config.dynamic = dynamic;
        config.metadata = metadata;
        let id = self.create(config)?;
        if let Some(zone) = self.zones.get_mut(&id) {
            zone.source = Some(source);
        }
        Ok(id)
    }

    /// Move a dynamic zone, keeping its orientation and extents
    pub fn set_position(&mut self, id: ZoneId, position: Vec3) -> Result<()> {
        if !position.is_finite() {
            return Err(Error::invalid("zone position must be finite"));
        }
        self.mutate(id, |zone| {
            zone.transform.origin = position;
        })
    }

    /// Resize a dynamic zone
    pub fn set_size(&mut self, id: ZoneId, size: Vec3) -> Result<()> {
        if !size.is_finite() || size.min_element() <= 0.0 {
            return Err(Error::invalid("zone size must be finite and positive"));
        }
        self.mutate(id, |zone| {
            zone.size = size;
        })
    }

    /// Re-derive a dynamic zone's placement and extents from its source
    pub fn sync_to_source(&mut self, id: ZoneId) -> Result<()> {
        let source = match self.zones.get(&id) {
            Some(zone) => zone.source.clone(),
            None => None,
        };
        let Some(source) = source else {
            return Err(Error::lifecycle(format!("{id} has no source to sync from")));
        };
        let (transform, size) = (source.transform(), source.size());
        if !transform.is_finite() || !size.is_finite() || size.min_element() <= 0.0 {
            return Err(Error::invalid("zone source reported a non-finite placement"));
        }
        self.mutate(id, |zone| {
            zone.transform = transform;
            zone.size = size;
        })
    }

    fn mutate(&mut self, id: ZoneId, apply: impl FnOnce(&mut Zone)) -> Result<()> {
        let doomed = self.is_pending_removal(id);
        let Some(zone) = self.zones.get_mut(&id) else {
            return Err(Error::lifecycle(format!("{id} does not exist")));
        };
        if doomed {
            return Err(Error::lifecycle(format!("{id} is destroyed")));
        }
        if !zone.dynamic {
            return Err(Error::invalid(format!("{id} is static and cannot be mutated")));
        }
        apply(zone);
        zone.recompute_aabb();
        self.dynamic_dirty.mark_mutated(id);
        Ok(())
    }

    /// Queue a zone for removal; the record survives until the next flush so
    /// synthetic exits can still read it
    pub fn destroy(&mut self, id: ZoneId) -> Result<()> {
        if self.is_pending_removal(id) {
            return Err(Error::lifecycle(format!("{id} is already destroyed")));
        }
        let Some(zone) = self.zones.get(&id) else {
            return Err(Error::lifecycle(format!("{id} does not exist")));
        };
        let dynamic = zone.dynamic;
        let dirty = self.dirty_for(dynamic);
        // A zone created and destroyed within one tick never reaches a tree
        if dirty.inserted.remove(&id) {
            self.zones.remove(&id);
            return Ok(());
        }
        dirty.mark_removed(id);
        Ok(())
    }

    pub fn is_pending_removal(&self, id: ZoneId) -> bool {
        self.static_dirty.removed.contains(&id) || self.dynamic_dirty.removed.contains(&id)
    }

    /// Ids queued for removal, ascending; empty between destroy and flush
    pub(crate) fn pending_removals(&self) -> Vec<ZoneId> {
        let mut ids: Vec<ZoneId> = self
            .static_dirty
            .removed
            .iter()
            .chain(self.dynamic_dirty.removed.iter())
            .copied()
            .collect();
        ids.sort();
        ids
    }

    /// Apply all pending mutations: at most one tree action per tree
    pub fn flush(&mut self) -> FlushReport {
        // Drop removed records first so rebuilds never see them
        for id in self.static_dirty.removed.iter().chain(self.dynamic_dirty.removed.iter()) {
            self.zones.remove(id);
        }

        let mut report = FlushReport::default();
        if !self.static_dirty.is_empty() {
            report.static_action = Some(Self::flush_tree(
                &self.zones,
                &mut self.static_tree,
                &self.static_dirty,
                &mut self.build_scratch,
                false,
            ));
            self.static_dirty.clear();
        }
        if !self.dynamic_dirty.is_empty() {
            report.dynamic_action = Some(Self::flush_tree(
                &self.zones,
                &mut self.dynamic_tree,
                &self.dynamic_dirty,
                &mut self.build_scratch,
                true,
            ));
            self.dynamic_dirty.clear();
        }
        report
    }

    fn flush_tree(
        zones: &HashMap<ZoneId, Zone>,
        tree: &mut Lbvh,
        dirty: &DirtySet,
        scratch: &mut Vec<(ZoneId, Aabb)>,
        dynamic: bool,
    ) -> TreeAction {
        let set_changed = !dirty.inserted.is_empty() || !dirty.removed.is_empty();
        let n = tree.len();

        // Refit only pays off for a small mutation batch over an unchanged set
        if !set_changed && dirty.mutated.len() <= n.div_ceil(16) {
            scratch.clear();
            scratch.extend(dirty.mutated.iter().filter_map(|id| {
                zones.get(id).map(|zone| (*id, zone.aabb))
            }));
            scratch.sort_by_key(|(id, _)| *id);
            tree.refit(scratch);
            log::trace!(
                "refit {} tree: {} of {} leaves",
                if dynamic { "dynamic" } else { "static" },
                scratch.len(),
                n
            );
            return TreeAction::Refit;
        }

        scratch.clear();
        scratch.extend(
            zones
                .values()
                .filter(|zone| zone.dynamic == dynamic)
                .map(|zone| (zone.id, zone.aabb)),
        );
        scratch.sort_by_key(|(id, _)| *id);
        tree.rebuild(scratch);
        log::debug!(
            "rebuilt {} tree: {} leaves",
            if dynamic { "dynamic" } else { "static" },
            scratch.len()
        );
        TreeAction::Rebuild
    }

    fn dirty_for(&mut self, dynamic: bool) -> &mut DirtySet {
        if dynamic {
            &mut self.dynamic_dirty
        } else {
            &mut self.static_dirty
        }
    }

    /// Iterate live zones (unordered)
    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }
}

impl Default for ZoneStore {
    fn default() -> Self {
        Self::new()
    }
}
