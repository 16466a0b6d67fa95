//! Axis-aligned bounding boxes.

use glam::Vec3;

/// Axis-aligned bounding box.
///
/// The empty box is inverted (+INF min, -INF max) so expanding it by any
/// real point yields a valid box without special-casing the first insert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Empty bounding box (inverted, will collapse onto the first point).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Expand to include a point.
    #[inline]
    pub fn expand_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Expand to include all three corners of a triangle.
    #[inline]
    pub fn expand_triangle(&mut self, v0: Vec3, v1: Vec3, v2: Vec3) {
        self.expand_point(v0);
        self.expand_point(v1);
        self.expand_point(v2);
    }

    /// Center of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Size along each axis.
    #[inline]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Axis of the largest extent (0 = x, 1 = y, 2 = z).
    ///
    /// The comparison chain is fixed (x vs y, then vs z) so that equal
    /// extents always resolve to the same axis and rebuilds on identical
    /// input are bit-for-bit reproducible.
    #[inline]
    pub fn max_extent_axis(&self) -> usize {
        let d = self.extent();
        if d.x > d.y {
            if d.x > d.z {
                0
            } else {
                2
            }
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_expand() {
        let mut b = Aabb::EMPTY;
        b.expand_point(Vec3::new(1.0, -2.0, 3.0));
        assert_eq!(b.min, Vec3::new(1.0, -2.0, 3.0));
        assert_eq!(b.max, Vec3::new(1.0, -2.0, 3.0));

        b.expand_point(Vec3::new(-1.0, 2.0, 0.0));
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_center_extent() {
        let mut b = Aabb::EMPTY;
        b.expand_triangle(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 4.0, 6.0),
        );
        assert_eq!(b.center(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(b.extent(), Vec3::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn test_max_extent_axis() {
        let b = Aabb {
            min: Vec3::ZERO,
            max: Vec3::new(3.0, 2.0, 1.0),
        };
        assert_eq!(b.max_extent_axis(), 0);

        let b = Aabb {
            min: Vec3::ZERO,
            max: Vec3::new(1.0, 3.0, 2.0),
        };
        assert_eq!(b.max_extent_axis(), 1);

        let b = Aabb {
            min: Vec3::ZERO,
            max: Vec3::new(1.0, 2.0, 3.0),
        };
        assert_eq!(b.max_extent_axis(), 2);

        // all extents equal resolves to z
        let b = Aabb {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        };
        assert_eq!(b.max_extent_axis(), 2);
    }
}
