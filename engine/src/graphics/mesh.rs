//! Renderable mesh data consumed by the physics layer
//!
//! A [`Mesh`] is geometry plus a local transform relative to the component
//! that owns it. Primitive generators cover cubes, boxes, spheres and planes.

use super::bounding::{Aabb, BoundingSphere};
use crate::core::entity::Transform;
use glam::Mat4;
use std::sync::{Arc, OnceLock};

/// Position buffer with an optional triangle index buffer.
///
/// Bounding volumes are computed on first request and cached; mutating
/// operations always produce a new `Geometry` so the caches never go stale.
#[derive(Debug, Default)]
pub struct Geometry {
    positions: Vec<f32>,
    indices: Option<Vec<u32>>,
    bounding_box: OnceLock<Aabb>,
    bounding_sphere: OnceLock<BoundingSphere>,
}

impl Clone for Geometry {
    fn clone(&self) -> Self {
        Self {
            positions: self.positions.clone(),
            indices: self.indices.clone(),
            bounding_box: OnceLock::new(),
            bounding_sphere: OnceLock::new(),
        }
    }
}

impl Geometry {
    /// Non-indexed geometry from a flat x,y,z buffer
    pub fn from_positions(positions: Vec<f32>) -> Self {
        Self {
            positions,
            ..Default::default()
        }
    }

    /// Indexed geometry from a flat x,y,z buffer and triangle indices
    pub fn indexed(positions: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices: Some(indices),
            ..Default::default()
        }
    }

    /// Indexed geometry from x,y,z points
    pub fn from_points(points: &[[f32; 3]], indices: Vec<u32>) -> Self {
        Self::indexed(bytemuck::cast_slice(points).to_vec(), indices)
    }

    /// Flat x,y,z positions
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Triangle indices, if the geometry is indexed
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// Number of x,y,z triples
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Local bounding box, computed once
    pub fn bounding_box(&self) -> Aabb {
        *self
            .bounding_box
            .get_or_init(|| Aabb::from_positions(&self.positions))
    }

    /// Local bounding sphere, computed once
    pub fn bounding_sphere(&self) -> BoundingSphere {
        *self
            .bounding_sphere
            .get_or_init(|| BoundingSphere::from_positions(&self.positions))
    }

    /// Copy of this geometry with every position transformed by `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> Geometry {
        let mut positions = Vec::with_capacity(self.positions.len());
        for point in self.positions.chunks_exact(3) {
            let p = matrix.transform_point3(glam::Vec3::new(point[0], point[1], point[2]));
            positions.extend_from_slice(&[p.x, p.y, p.z]);
        }
        Geometry {
            positions,
            indices: self.indices.clone(),
            ..Default::default()
        }
    }

    /// Give up the buffers
    pub fn into_buffers(self) -> (Vec<f32>, Option<Vec<u32>>) {
        (self.positions, self.indices)
    }
}

/// Geometry placed relative to its owning component
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Arc<Geometry>,
    /// Local transform relative to the owning component
    pub transform: Transform,
}

impl Mesh {
    /// Create a mesh with identity local transform
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Arc::new(geometry),
            transform: Transform::default(),
        }
    }

    /// Set the local transform of the mesh
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Local matrix of the mesh
    pub fn local_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// Create a cube mesh centered at the origin with each side `size` long
    pub fn cube(size: f32) -> Self {
        Self::cuboid(glam::Vec3::splat(size))
    }

    /// Create a box mesh centered at the origin with the given extents
    pub fn cuboid(size: glam::Vec3) -> Self {
        let h = size * 0.5;

        let positions = [
            [-h.x, -h.y, -h.z], // 0: left bottom back
            [h.x, -h.y, -h.z],  // 1: right bottom back
            [h.x, h.y, -h.z],   // 2: right top back
            [-h.x, h.y, -h.z],  // 3: left top back
            [-h.x, -h.y, h.z],  // 4: left bottom front
            [h.x, -h.y, h.z],   // 5: right bottom front
            [h.x, h.y, h.z],    // 6: right top front
            [-h.x, h.y, h.z],   // 7: left top front
        ];

        let indices = vec![
            4, 5, 6, 4, 6, 7, // front
            1, 0, 3, 1, 3, 2, // back
            7, 6, 2, 7, 2, 3, // top
            0, 1, 5, 0, 5, 4, // bottom
            5, 1, 2, 5, 2, 6, // right
            0, 4, 7, 0, 7, 3, // left
        ];

        Self::new(Geometry::from_points(&positions, indices))
    }

    /// Create a double-sided plane mesh on the XZ plane
    pub fn plane(width: f32, depth: f32) -> Self {
        let half_width = width * 0.5;
        let half_depth = depth * 0.5;

        let positions = [
            [-half_width, 0.0, -half_depth],
            [half_width, 0.0, -half_depth],
            [half_width, 0.0, half_depth],
            [-half_width, 0.0, half_depth],
        ];

        let indices = vec![0, 1, 2, 0, 2, 3, 0, 2, 1, 0, 3, 2];

        Self::new(Geometry::from_points(&positions, indices))
    }

    /// Create a UV sphere mesh
    ///
    /// # Arguments
    /// * `radius` - Radius of the sphere
    /// * `sectors` - Number of longitude divisions (minimum 3)
    /// * `stacks` - Number of latitude divisions (minimum 2)
    pub fn sphere(radius: f32, sectors: u32, stacks: u32) -> Self {
        let sectors = sectors.max(3);
        let stacks = stacks.max(2);

        let mut points = Vec::new();

        let sector_step = 2.0 * std::f32::consts::PI / sectors as f32;
        let stack_step = std::f32::consts::PI / stacks as f32;

        for i in 0..=stacks {
            let stack_angle = std::f32::consts::PI / 2.0 - i as f32 * stack_step;
            let xy = radius * stack_angle.cos();
            let z = radius * stack_angle.sin();

            for j in 0..=sectors {
                let sector_angle = j as f32 * sector_step;
                let x = xy * sector_angle.cos();
                let y = xy * sector_angle.sin();

                points.push([x, z, y]);
            }
        }

        let mut indices = Vec::new();
        for i in 0..stacks {
            for j in 0..sectors {
                let first = i * (sectors + 1) + j;
                let second = first + sectors + 1;
                indices.extend_from_slice(&[first, second, first + 1]);
                indices.extend_from_slice(&[second, second + 1, first + 1]);
            }
        }

        Self::new(Geometry::from_points(&points, indices))
    }
}
