//! Tracked entities and their scheduling groups

pub mod group;

pub use group::{
    EntityHandle, EntityId, Group, GroupConfig, GroupId, GroupRole, PositionProbe,
};
