//! Morton encoding (Z-order curve) for spatial indexing
//!
//! Zone centroids are quantized onto a 1024^3 grid spanning the centroid
//! bounds of the tree being built, then interleaved into a 30-bit code.

use crate::core::types::Vec3;

/// Spread bits of a 10-bit integer into every third bit of a 32-bit integer
fn spread_bits(x: u32) -> u32 {
    let mut x = x & 0x3ff; // 10 bits max
    x = (x | (x << 16)) & 0x030000ff;
    x = (x | (x << 8)) & 0x0300f00f;
    x = (x | (x << 4)) & 0x030c30c3;
    x = (x | (x << 2)) & 0x09249249;
    x
}

/// Compact every third bit of a 32-bit integer into a 10-bit integer
fn compact_bits(x: u32) -> u32 {
    let mut x = x & 0x09249249;
    x = (x | (x >> 2)) & 0x030c30c3;
    x = (x | (x >> 4)) & 0x0300f00f;
    x = (x | (x >> 8)) & 0x030000ff;
    x = (x | (x >> 16)) & 0x3ff;
    x
}

/// Encode 3D grid coordinates into a 30-bit Morton code
/// Each coordinate can be up to 10 bits (0..1023)
pub fn encode_morton_3d(x: u32, y: u32, z: u32) -> u32 {
    spread_bits(x) | (spread_bits(y) << 1) | (spread_bits(z) << 2)
}

/// Decode Morton code back to 3D grid coordinates
pub fn decode_morton_3d(code: u32) -> (u32, u32, u32) {
    (
        compact_bits(code),
        compact_bits(code >> 1),
        compact_bits(code >> 2),
    )
}

/// Maps world-space centroids onto the 1024^3 Morton grid.
///
/// Rebuilt from the centroid bounds of the tree on every full rebuild.
/// Axes with zero extent collapse to cell 0.
#[derive(Clone, Copy, Debug)]
pub struct MortonGrid {
    min: Vec3,
    inv_extent: Vec3,
}

impl MortonGrid {
    const CELLS: f32 = 1023.0;

    /// Build a grid covering `[min, max]`
    pub fn from_bounds(min: Vec3, max: Vec3) -> Self {
        let extent = max - min;
        let inv_extent = Vec3::new(
            if extent.x > 0.0 { 1.0 / extent.x } else { 0.0 },
            if extent.y > 0.0 { 1.0 / extent.y } else { 0.0 },
            if extent.z > 0.0 { 1.0 / extent.z } else { 0.0 },
        );
        Self { min, inv_extent }
    }

    /// Quantize a world-space point to grid coordinates
    pub fn quantize(&self, p: Vec3) -> (u32, u32, u32) {
        let n = (p - self.min) * self.inv_extent * Self::CELLS;
        (
            (n.x.clamp(0.0, Self::CELLS)) as u32,
            (n.y.clamp(0.0, Self::CELLS)) as u32,
            (n.z.clamp(0.0, Self::CELLS)) as u32,
        )
    }

    /// Morton code of a world-space point
    pub fn code(&self, p: Vec3) -> u32 {
        let (x, y, z) = self.quantize(p);
        encode_morton_3d(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        for x in [0, 1, 10, 100, 500, 1000, 1023] {
            for y in [0, 1, 10, 100, 500, 1000, 1023] {
                for z in [0, 1, 10, 100, 500, 1000, 1023] {
                    let code = encode_morton_3d(x, y, z);
                    let (dx, dy, dz) = decode_morton_3d(code);
                    assert_eq!((x, y, z), (dx, dy, dz), "Failed for ({}, {}, {})", x, y, z);
                }
            }
        }
    }

    #[test]
    fn test_ordering() {
        // Morton codes should interleave bits
        assert_eq!(encode_morton_3d(0, 0, 0), 0);
        assert_eq!(encode_morton_3d(1, 0, 0), 1);
        assert_eq!(encode_morton_3d(0, 1, 0), 2);
        assert_eq!(encode_morton_3d(0, 0, 1), 4);
        assert_eq!(encode_morton_3d(1, 1, 1), 7);
    }

    #[test]
    fn test_code_fits_30_bits() {
        assert_eq!(encode_morton_3d(1023, 1023, 1023), (1 << 30) - 1);
    }

    #[test]
    fn test_grid_quantize_bounds() {
        let grid = MortonGrid::from_bounds(Vec3::splat(-10.0), Vec3::splat(10.0));
        assert_eq!(grid.quantize(Vec3::splat(-10.0)), (0, 0, 0));
        assert_eq!(grid.quantize(Vec3::splat(10.0)), (1023, 1023, 1023));

        // Points outside the bounds clamp to the grid edge
        assert_eq!(grid.quantize(Vec3::splat(100.0)), (1023, 1023, 1023));
    }

    #[test]
    fn test_grid_degenerate_axis() {
        // All centroids on one plane: that axis collapses to cell 0
        let grid = MortonGrid::from_bounds(Vec3::new(0.0, 5.0, 0.0), Vec3::new(8.0, 5.0, 8.0));
        let (_, y, _) = grid.quantize(Vec3::new(4.0, 5.0, 4.0));
        assert_eq!(y, 0);
    }

    #[test]
    fn test_grid_preserves_locality() {
        let grid = MortonGrid::from_bounds(Vec3::ZERO, Vec3::splat(100.0));
        let a = grid.code(Vec3::new(1.0, 1.0, 1.0));
        let b = grid.code(Vec3::new(99.0, 99.0, 99.0));
        assert!(a < b);
    }
}
