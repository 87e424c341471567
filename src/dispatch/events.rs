//! Event payloads and callback registries

use crate::core::types::Metadata;
use crate::group::{EntityHandle, EntityId, GroupId};
use crate::zone::ZoneId;
use super::commands::Commands;

/// Payload for per-entity enter/exit events
#[derive(Clone)]
pub struct ZoneEvent {
    pub entity: EntityId,
    /// The host's own key for the entity
    pub handle: EntityHandle,
    pub group: GroupId,
    pub zone: ZoneId,
    /// Zone metadata as captured at enter time; present on exits even when
    /// the zone has since been destroyed
    pub zone_metadata: Option<Metadata>,
    pub entity_metadata: Option<Metadata>,
}

/// Payload for group-level occupancy events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupEvent {
    pub group: GroupId,
    pub zone: ZoneId,
}

/// Cleanup closure returned by an observe-style registration; runs exactly
/// once at the matching exit
pub type Cleanup = Box<dyn FnOnce(&mut Commands)>;

pub type EventFn = Box<dyn FnMut(&ZoneEvent, &mut Commands)>;
pub type GroupEventFn = Box<dyn FnMut(&GroupEvent, &mut Commands)>;
pub type ObserveFn = Box<dyn FnMut(&ZoneEvent, &mut Commands) -> Option<Cleanup>>;
pub type ObserveGroupFn = Box<dyn FnMut(&GroupEvent, &mut Commands) -> Option<Cleanup>>;

/// Callback registries of one observer, keyed by event kind
#[derive(Default)]
pub struct CallbackRegistry {
    pub(crate) entered: Vec<EventFn>,
    pub(crate) exited: Vec<EventFn>,
    pub(crate) group_entered: Vec<GroupEventFn>,
    pub(crate) group_exited: Vec<GroupEventFn>,
    pub(crate) player_entered: Vec<EventFn>,
    pub(crate) player_exited: Vec<EventFn>,
    pub(crate) local_player_entered: Vec<EventFn>,
    pub(crate) local_player_exited: Vec<EventFn>,
    pub(crate) observe: Vec<ObserveFn>,
    pub(crate) observe_group: Vec<ObserveGroupFn>,
    pub(crate) observe_player: Vec<ObserveFn>,
    pub(crate) observe_local_player: Vec<ObserveFn>,
}
