//! World-space bounding boxes for zone leaves and tree nodes
//!
//! Leaves carry the conservative box of their zone's shape; internal tree
//! nodes carry the running union of their subtree. Two operations dominate:
//! the stabbing test during descent and the union when boxes are swept or
//! refitted.

use crate::core::types::Vec3;

/// Axis-aligned box stored as a corner pair, `min <= max` per axis
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Degenerate box of a single point; the seed for vertex sweeps and
    /// centroid bounds
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Symmetric box around `center`
    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Stabbing test; the boundary counts as inside
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Grow to cover `p`
    pub fn expand(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Smallest box covering both operands
    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stab_includes_boundary() {
        let aabb = Aabb::new(Vec3::new(-2.0, 0.0, 1.0), Vec3::new(2.0, 4.0, 3.0));
        assert!(aabb.contains_point(Vec3::new(0.0, 2.0, 2.0)));
        assert!(aabb.contains_point(aabb.min));
        assert!(aabb.contains_point(aabb.max));
        assert!(!aabb.contains_point(Vec3::new(0.0, 4.1, 2.0)));
        assert!(!aabb.contains_point(Vec3::new(-2.1, 2.0, 2.0)));
    }

    #[test]
    fn test_point_box_is_degenerate() {
        let p = Vec3::new(3.0, -1.0, 7.0);
        let aabb = Aabb::from_point(p);
        assert_eq!(aabb.center(), p);
        assert!(aabb.contains_point(p));
        assert!(!aabb.contains_point(p + Vec3::splat(1e-3)));
    }

    #[test]
    fn test_vertex_sweep() {
        let mut aabb = Aabb::from_point(Vec3::ZERO);
        for v in [
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(0.0, -3.0, 0.0),
            Vec3::new(1.0, 1.0, 2.0),
        ] {
            aabb.expand(v);
        }
        assert_eq!(aabb.min, Vec3::new(0.0, -3.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(4.0, 1.0, 2.0));
    }

    #[test]
    fn test_union_covers_both() {
        let a = Aabb::from_center_half_extent(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_center_half_extent(Vec3::new(10.0, 0.0, 0.0), Vec3::splat(2.0));
        let union = a.merged(&b);
        for p in [a.min, a.max, b.min, b.max] {
            assert!(union.contains_point(p));
        }
        // Union of disjoint boxes covers the gap too; that is what makes the
        // tree's internal nodes conservative
        assert!(union.contains_point(Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_center_of_symmetric_box() {
        let aabb = Aabb::from_center_half_extent(Vec3::new(1.0, 2.0, 3.0), Vec3::splat(4.0));
        assert_eq!(aabb.center(), Vec3::new(1.0, 2.0, 3.0));
    }
}
