//! Bounding volume hierarchies for stabbing queries

pub mod lbvh;

pub use lbvh::Lbvh;
