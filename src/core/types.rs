//! Core type aliases and re-exports

pub use glam::{Mat3, Vec3};

/// Standard Result type for the engine
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;

/// Opaque user payload carried by zones and entities
///
/// The engine never looks inside; it only clones the handle into events.
pub type Metadata = std::rc::Rc<dyn std::any::Any>;
