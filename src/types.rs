//! Core point types.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// A 3D point in the caller's coordinate frame.
///
/// Small `#[repr(C)]` representation with a stable layout, so flat `[f32]`
/// buffers (e.g. `N x 3` tensors copied off an accelerator) can be cast
/// directly with `bytemuck::cast_slice`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Create from any type implementing `Point3Like`.
    #[inline]
    pub fn from_like<P: Point3Like>(p: &P) -> Self {
        Self::new(p.x(), p.y(), p.z())
    }

    /// Returns true if every coordinate is finite (no NaN or infinity).
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Euclidean distance to another point, as used for ranking.
    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        crate::rank::euclidean(self.to_vec3(), other.to_vec3())
    }

    #[inline]
    pub(crate) fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl From<[f32; 3]> for Point3 {
    #[inline]
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Point3> for [f32; 3] {
    #[inline]
    fn from(p: Point3) -> Self {
        [p.x, p.y, p.z]
    }
}

impl From<glam::Vec3> for Point3 {
    #[inline]
    fn from(v: glam::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Point3> for glam::Vec3 {
    #[inline]
    fn from(p: Point3) -> glam::Vec3 {
        p.to_vec3()
    }
}

/// Trait for types that can be used as input points.
///
/// This allows zero-copy input from various math libraries.
pub trait Point3Like {
    fn x(&self) -> f32;
    fn y(&self) -> f32;
    fn z(&self) -> f32;
}

impl Point3Like for Point3 {
    #[inline]
    fn x(&self) -> f32 {
        self.x
    }
    #[inline]
    fn y(&self) -> f32 {
        self.y
    }
    #[inline]
    fn z(&self) -> f32 {
        self.z
    }
}

impl Point3Like for [f32; 3] {
    #[inline]
    fn x(&self) -> f32 {
        self[0]
    }
    #[inline]
    fn y(&self) -> f32 {
        self[1]
    }
    #[inline]
    fn z(&self) -> f32 {
        self[2]
    }
}

impl Point3Like for (f32, f32, f32) {
    #[inline]
    fn x(&self) -> f32 {
        self.0
    }
    #[inline]
    fn y(&self) -> f32 {
        self.1
    }
    #[inline]
    fn z(&self) -> f32 {
        self.2
    }
}

impl Point3Like for glam::Vec3 {
    #[inline]
    fn x(&self) -> f32 {
        self.x
    }
    #[inline]
    fn y(&self) -> f32 {
        self.y
    }
    #[inline]
    fn z(&self) -> f32 {
        self.z
    }
}

#[inline]
pub(crate) fn to_vec3<P: Point3Like>(p: &P) -> Vec3 {
    Vec3::new(p.x(), p.y(), p.z())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point3_distance() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(b.distance(a), 5.0);
    }

    #[test]
    fn test_from_array() {
        let p: Point3 = [0.0, 1.0, 2.0].into();
        assert_eq!(p.y, 1.0);
        let back: [f32; 3] = p.into();
        assert_eq!(back, [0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_is_finite() {
        assert!(Point3::new(1.0, -2.0, 3.0).is_finite());
        assert!(!Point3::new(f32::NAN, 0.0, 0.0).is_finite());
        assert!(!Point3::new(0.0, f32::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn test_cast_flat_buffer() {
        let flat = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let points: &[Point3] = bytemuck::cast_slice(&flat);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], Point3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_point3_like_trait() {
        fn accepts_like<P: Point3Like>(p: &P) -> f32 {
            p.x() + p.y() + p.z()
        }

        let p = Point3::new(1.0, 2.0, 3.0);
        let arr = [1.0f32, 2.0, 3.0];
        let tuple = (1.0f32, 2.0f32, 3.0f32);

        assert_eq!(accepts_like(&p), 6.0);
        assert_eq!(accepts_like(&arr), 6.0);
        assert_eq!(accepts_like(&tuple), 6.0);
    }

    #[test]
    fn test_point3_like_trait_glam() {
        let v = glam::Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Point3::from_like(&v), Point3::new(1.0, 2.0, 3.0));
    }
}
