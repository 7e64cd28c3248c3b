//! Bounding volumes computed from geometry buffers

use glam::{Mat4, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// An inverted box that any point expands
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Smallest box containing every point of a flat x,y,z buffer
    pub fn from_positions(positions: &[f32]) -> Self {
        let mut aabb = Self::empty();
        for point in positions.chunks_exact(3) {
            aabb.expand_to_include(Vec3::new(point[0], point[1], point[2]));
        }
        aabb
    }

    /// True when no point has been added
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// Expand this AABB to include a point
    pub fn expand_to_include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        (self.min + self.max) * 0.5
    }

    /// Full extent along each axis
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        self.max - self.min
    }

    /// Box enclosing the eight transformed corners of this box
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }

        let mut out = Aabb::empty();
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            out.expand_to_include(matrix.transform_point3(corner));
        }
        out
    }
}

/// Sphere enclosing a set of points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Sphere centered on the points' AABB, reaching the farthest point
    pub fn from_positions(positions: &[f32]) -> Self {
        let center = Aabb::from_positions(positions).center();
        let radius_sq = positions
            .chunks_exact(3)
            .map(|point| center.distance_squared(Vec3::new(point[0], point[1], point[2])))
            .fold(0.0_f32, f32::max);

        Self {
            center,
            radius: radius_sq.sqrt(),
        }
    }
}
