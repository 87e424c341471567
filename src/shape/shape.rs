//! Convex zone primitives: exact containment and enclosing AABBs
//!
//! All four primitives are defined by a transform plus full extents along
//! the three local axes. Containment runs in the local frame without heap
//! allocation; hot paths match on the shape tag and inline the per-shape
//! math.

use crate::core::types::{Mat3, Vec3};
use crate::math::Aabb;
use super::transform::Transform;

/// Shape tag for the four convex primitives
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ShapeKind {
    /// Oriented box
    Block,
    /// Sphere, radius = max extent / 2
    Ball,
    /// Axis along local Y, radius = min(x, z extents) / 2
    Cylinder,
    /// Block cut by the half-space `y/ey + z/ez <= 1/2`
    Wedge,
}

/// Exact point-in-shape test
pub fn contains(kind: ShapeKind, transform: &Transform, size: Vec3, p: Vec3) -> bool {
    let local = transform.to_local(p);
    let half = size * 0.5;
    match kind {
        ShapeKind::Block => {
            local.x.abs() <= half.x && local.y.abs() <= half.y && local.z.abs() <= half.z
        }
        ShapeKind::Ball => {
            let r = half.max_element();
            local.length_squared() <= r * r
        }
        ShapeKind::Cylinder => {
            let r = half.x.min(half.z);
            local.y.abs() <= half.y && local.x * local.x + local.z * local.z <= r * r
        }
        ShapeKind::Wedge => {
            local.x.abs() <= half.x
                && local.y.abs() <= half.y
                && local.z.abs() <= half.z
                && local.y / size.y + local.z / size.z <= 0.5
        }
    }
}

/// World-space AABB conservatively enclosing the shape
pub fn aabb_of(kind: ShapeKind, transform: &Transform, size: Vec3) -> Aabb {
    let half = size * 0.5;
    match kind {
        ShapeKind::Block => rotated_box_aabb(transform, half),
        ShapeKind::Ball => {
            let r = half.max_element();
            Aabb::from_center_half_extent(transform.origin, Vec3::splat(r))
        }
        ShapeKind::Cylinder => {
            let r = half.x.min(half.z);
            rotated_box_aabb(transform, Vec3::new(r, half.y, r))
        }
        ShapeKind::Wedge => {
            // World box of the wedge's boundary vertices: the sloped face
            // meets the box at y=0/z=hz and y=hy/z=0, so the cross-section
            // is a pentagon swept along local X.
            let section = [
                (-half.y, -half.z),
                (-half.y, half.z),
                (0.0, half.z),
                (half.y, 0.0),
                (half.y, -half.z),
            ];
            let mut aabb = Aabb::from_point(transform.to_world(Vec3::new(
                -half.x, section[0].0, section[0].1,
            )));
            for x in [-half.x, half.x] {
                for (y, z) in section {
                    aabb.expand(transform.to_world(Vec3::new(x, y, z)));
                }
            }
            aabb
        }
    }
}

/// AABB of a rotated local box via the absolute basis
fn rotated_box_aabb(transform: &Transform, half: Vec3) -> Aabb {
    let world_half = abs_rotate(&transform.basis, half);
    Aabb::from_center_half_extent(transform.origin, world_half)
}

fn abs_rotate(basis: &Mat3, half: Vec3) -> Vec3 {
    Vec3::new(
        basis.row(0).abs().dot(half),
        basis.row(1).abs().dot(half),
        basis.row(2).abs().dot(half),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    const SIZE: Vec3 = Vec3::new(10.0, 10.0, 10.0);

    #[test]
    fn test_block_contains() {
        let t = Transform::IDENTITY;
        assert!(contains(ShapeKind::Block, &t, SIZE, Vec3::new(4.0, 4.0, 4.0)));
        assert!(contains(ShapeKind::Block, &t, SIZE, Vec3::new(5.0, 5.0, 5.0))); // face
        assert!(!contains(ShapeKind::Block, &t, SIZE, Vec3::new(6.0, 0.0, 0.0)));
    }

    #[test]
    fn test_block_contains_rotated() {
        // 45 degrees about Y: the world X axis maps to a box diagonal
        let t = Transform::new(Vec3::ZERO, Mat3::from_rotation_y(FRAC_PI_4));
        let reach = 5.0 * 2f32.sqrt();
        assert!(contains(ShapeKind::Block, &t, SIZE, Vec3::new(reach - 0.01, 0.0, 0.0)));
        assert!(!contains(ShapeKind::Block, &t, SIZE, Vec3::new(5.5, 0.0, 5.5)));
    }

    #[test]
    fn test_ball_radius_from_max_extent() {
        let t = Transform::IDENTITY;
        let size = Vec3::new(4.0, 10.0, 4.0);
        // Radius is max extent / 2 = 5
        assert!(contains(ShapeKind::Ball, &t, size, Vec3::new(4.9, 0.0, 0.0)));
        assert!(!contains(ShapeKind::Ball, &t, size, Vec3::new(5.1, 0.0, 0.0)));
    }

    #[test]
    fn test_cylinder_caps_and_radius() {
        let t = Transform::IDENTITY;
        let size = Vec3::new(6.0, 10.0, 8.0); // R = min(3, 4) = 3, half height 5
        assert!(contains(ShapeKind::Cylinder, &t, size, Vec3::new(2.9, 4.9, 0.0)));
        assert!(!contains(ShapeKind::Cylinder, &t, size, Vec3::new(3.1, 0.0, 0.0)));
        assert!(!contains(ShapeKind::Cylinder, &t, size, Vec3::new(0.0, 5.1, 0.0)));
        // Inside the corner of the box but outside the circular section
        assert!(!contains(ShapeKind::Cylinder, &t, size, Vec3::new(2.5, 0.0, 2.5)));
    }

    #[test]
    fn test_wedge_half_space() {
        let t = Transform::IDENTITY;
        // Bottom of the box is fully inside the wedge
        assert!(contains(ShapeKind::Wedge, &t, SIZE, Vec3::new(0.0, -4.0, 4.0)));
        // Top-front corner is cut away
        assert!(!contains(ShapeKind::Wedge, &t, SIZE, Vec3::new(0.0, 4.0, 4.0)));
        // Top-back corner survives the cut
        assert!(contains(ShapeKind::Wedge, &t, SIZE, Vec3::new(0.0, 4.0, -4.5)));
        // On the sloped face
        assert!(contains(ShapeKind::Wedge, &t, SIZE, Vec3::new(0.0, 5.0, -5.0)));
    }

    #[test]
    fn test_aabb_encloses_block() {
        let t = Transform::new(Vec3::new(1.0, 2.0, 3.0), Mat3::from_rotation_z(0.3));
        let aabb = aabb_of(ShapeKind::Block, &t, SIZE);
        for p in [
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(-5.0, -5.0, -5.0),
            Vec3::new(5.0, -5.0, 5.0),
        ] {
            assert!(aabb.contains_point(t.to_world(p)));
        }
    }

    #[test]
    fn test_aabb_ball_ignores_rotation() {
        let rotated = Transform::new(Vec3::ZERO, Mat3::from_rotation_x(1.0));
        let aabb = aabb_of(ShapeKind::Ball, &rotated, Vec3::new(2.0, 8.0, 2.0));
        assert_eq!(aabb.min, Vec3::splat(-4.0));
        assert_eq!(aabb.max, Vec3::splat(4.0));
    }

    #[test]
    fn test_aabb_cylinder_tighter_than_block() {
        let t = Transform::IDENTITY;
        let size = Vec3::new(4.0, 10.0, 8.0); // R = 2
        let aabb = aabb_of(ShapeKind::Cylinder, &t, size);
        assert_eq!(aabb.min, Vec3::new(-2.0, -5.0, -2.0));
        assert_eq!(aabb.max, Vec3::new(2.0, 5.0, 2.0));
    }

    #[test]
    fn test_aabb_wedge_tighter_under_rotation() {
        // Rotate about X so the cut corner would have been the extreme point
        let t = Transform::new(Vec3::ZERO, Mat3::from_rotation_x(-FRAC_PI_4));
        let wedge = aabb_of(ShapeKind::Wedge, &t, SIZE);
        let block = aabb_of(ShapeKind::Block, &t, SIZE);
        assert!(wedge.max.y < block.max.y);
        // Still conservative: wedge vertices stay inside
        assert!(wedge.contains_point(t.to_world(Vec3::new(0.0, 5.0, -5.0))));
    }

    #[test]
    fn test_contains_consistent_with_aabb() {
        // Anything the exact test accepts must be inside the AABB
        let t = Transform::new(Vec3::new(3.0, -1.0, 2.0), Mat3::from_rotation_y(0.7));
        for kind in [ShapeKind::Block, ShapeKind::Ball, ShapeKind::Cylinder, ShapeKind::Wedge] {
            let aabb = aabb_of(kind, &t, SIZE);
            for x in -6..=6 {
                for y in -6..=6 {
                    let p = Vec3::new(x as f32, y as f32, 1.5) + t.origin;
                    if contains(kind, &t, SIZE, p) {
                        assert!(aabb.contains_point(p), "{:?} point {:?}", kind, p);
                    }
                }
            }
        }
    }
}
