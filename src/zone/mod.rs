//! Zones: records, ownership, dirty batching

pub mod zone;
pub mod store;

pub use zone::{Zone, ZoneConfig, ZoneId, ZoneSource};
pub use store::{FlushReport, TreeAction, ZoneStore};
