//! Zone records

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::core::types::{Metadata, Vec3};
use crate::math::Aabb;
use crate::observer::ObserverId;
use crate::shape::{self, ShapeKind, Transform};

/// Stable zone identifier, monotonically assigned and never reused
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(pub u64);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone#{}", self.0)
    }
}

/// Host object a zone can be derived from and later re-synced to
///
/// Stands in for whatever the host calls a "part": anything that can report
/// a placement, extents, and a primitive kind.
pub trait ZoneSource {
    fn transform(&self) -> Transform;
    fn size(&self) -> Vec3;
    fn shape(&self) -> ShapeKind {
        ShapeKind::Block
    }
}

/// Construction parameters for a zone
#[derive(Clone)]
pub struct ZoneConfig {
    pub transform: Transform,
    pub size: Vec3,
    pub shape: ShapeKind,
    /// Dynamic zones may move or resize and live in the dynamic tree
    pub dynamic: bool,
    pub metadata: Option<Metadata>,
}

impl ZoneConfig {
    pub fn new(transform: Transform, size: Vec3, shape: ShapeKind) -> Self {
        Self {
            transform,
            size,
            shape,
            dynamic: false,
            metadata: None,
        }
    }

    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A closed convex volume tracked by the engine
pub struct Zone {
    pub(crate) id: ZoneId,
    pub(crate) shape: ShapeKind,
    pub(crate) transform: Transform,
    pub(crate) size: Vec3,
    pub(crate) dynamic: bool,
    /// World AABB, conservative; immutable after creation for static zones
    pub(crate) aabb: Aabb,
    pub(crate) metadata: Option<Metadata>,
    /// Observers this zone is attached to
    pub(crate) observers: HashSet<ObserverId>,
    pub(crate) source: Option<Rc<dyn ZoneSource>>,
}

impl Zone {
    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Exact point-in-shape test
    pub fn contains_point(&self, p: Vec3) -> bool {
        shape::contains(self.shape, &self.transform, self.size, p)
    }

    pub(crate) fn recompute_aabb(&mut self) {
        self.aabb = shape::aabb_of(self.shape, &self.transform, self.size);
    }
}
