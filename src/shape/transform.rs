//! Rigid transform with an orthonormal basis

use crate::core::types::{Mat3, Vec3};

/// Placement of a zone in world space
///
/// `basis` columns are the zone's local axes expressed in world space and
/// must stay orthonormal; world-to-local therefore uses the transpose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub origin: Vec3,
    pub basis: Mat3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        origin: Vec3::ZERO,
        basis: Mat3::IDENTITY,
    };

    pub fn new(origin: Vec3, basis: Mat3) -> Self {
        Self { origin, basis }
    }

    /// Axis-aligned placement at `origin`
    pub fn from_origin(origin: Vec3) -> Self {
        Self { origin, basis: Mat3::IDENTITY }
    }

    /// Transform a world-space point into the local frame
    pub fn to_local(&self, p: Vec3) -> Vec3 {
        self.basis.transpose() * (p - self.origin)
    }

    /// Transform a local-space point into world space
    pub fn to_world(&self, p: Vec3) -> Vec3 {
        self.basis * p + self.origin
    }

    pub fn is_finite(&self) -> bool {
        self.origin.is_finite() && self.basis.is_finite()
    }
}
