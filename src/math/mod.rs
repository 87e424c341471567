//! Mathematical utilities and data structures

pub mod aabb;
pub mod morton;
pub mod radix;

pub use aabb::Aabb;
pub use morton::MortonGrid;
pub use radix::RadixSorter;
