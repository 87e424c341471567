//! Zonic - a spatial containment engine
//!
//! Tracks which zones (closed convex volumes) contain which entities
//! (points with host-supplied position probes) and dispatches enter/exit
//! events, smearing the work across ticks under a wall-clock budget.

pub mod core;
pub mod math;
pub mod shape;
pub mod bvh;
pub mod zone;
pub mod group;
pub mod observer;
pub mod dispatch;
pub mod schedule;
pub mod engine;

pub use engine::{Engine, EngineConfig};
pub use dispatch::{Cleanup, Commands, GroupEvent, ZoneEvent};
pub use group::{EntityHandle, EntityId, GroupConfig, GroupId, PositionProbe};
pub use observer::{ObserverConfig, ObserverId};
pub use shape::{ShapeKind, Transform};
pub use zone::{ZoneConfig, ZoneId, ZoneSource};
