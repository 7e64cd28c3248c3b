//! Box, sphere and triangle-soup measurements of render meshes
//!
//! Every extractor works in the owning component's frame: the mesh's local
//! transform and the component's world scale are applied, world rotation and
//! translation are not.

use crate::graphics::Mesh;
use glam::{Mat4, Vec3};
use std::collections::HashMap;

/// Extent and center of a mesh's bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxBounds {
    pub size: Vec3,
    pub center: Vec3,
}

/// Radius and center of a mesh's bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereBounds {
    pub radius: f32,
    pub center: Vec3,
}

/// Flat vertex buffer plus triangle indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedGeometry {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl IndexedGeometry {
    /// Number of x,y,z triples
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Whether every index names an existing vertex
    pub fn indices_in_range(&self) -> bool {
        let count = self.vertex_count();
        self.indices.iter().all(|&i| (i as usize) < count)
    }

    /// Position buffer with one entry per index, undoing a weld.
    ///
    /// `None` if an index points past the vertex buffer.
    pub fn expand(&self) -> Option<Vec<f32>> {
        let mut out = Vec::with_capacity(self.indices.len() * 3);
        for &index in &self.indices {
            let start = index as usize * 3;
            out.extend_from_slice(self.vertices.get(start..start + 3)?);
        }
        Some(out)
    }

    fn scale(&mut self, scale: Vec3) {
        for point in self.vertices.chunks_exact_mut(3) {
            point[0] *= scale.x;
            point[1] *= scale.y;
            point[2] *= scale.z;
        }
    }
}

/// Bounding box of the mesh after its local transform, scaled by the world scale
pub fn box_bounds(mesh: &Mesh, world_scale: Vec3) -> BoxBounds {
    let matrix = Mat4::from_scale(world_scale) * mesh.local_matrix();
    let aabb = mesh.geometry.bounding_box().transformed(&matrix);

    BoxBounds {
        size: aabb.size(),
        center: aabb.center(),
    }
}

/// Bounding sphere grown by the largest world scale axis and shifted by the
/// mesh's local position
pub fn sphere_bounds(mesh: &Mesh, world_scale: Vec3) -> SphereBounds {
    let sphere = mesh.geometry.bounding_sphere();

    SphereBounds {
        radius: sphere.radius * world_scale.abs().max_element(),
        center: sphere.center + mesh.transform.position,
    }
}

/// Vertex and index buffers of the mesh in the component frame.
///
/// Indexed sources keep their index buffer. Non-indexed sources are welded on
/// exact positional equality first.
pub fn indexed_geometry(mesh: &Mesh, world_scale: Vec3) -> IndexedGeometry {
    let (positions, indices) = mesh
        .geometry
        .transformed(&mesh.local_matrix())
        .into_buffers();

    let mut geometry = match indices {
        Some(indices) => IndexedGeometry {
            vertices: positions,
            indices,
        },
        None => weld_vertices(&positions),
    };
    geometry.scale(world_scale);
    geometry
}

/// Merge exactly equal positions, numbering them in first-seen order.
///
/// No tolerance is applied; the two signed zeros count as equal. The index
/// buffer has one entry per input vertex and a trailing partial triple is
/// ignored.
pub fn weld_vertices(positions: &[f32]) -> IndexedGeometry {
    let count = positions.len() / 3;
    let mut lookup: HashMap<[u32; 3], u32> = HashMap::with_capacity(count);
    let mut welded = IndexedGeometry {
        vertices: Vec::new(),
        indices: Vec::with_capacity(count),
    };

    for point in positions.chunks_exact(3) {
        let key = [weld_key(point[0]), weld_key(point[1]), weld_key(point[2])];
        let index = *lookup.entry(key).or_insert_with(|| {
            welded.vertices.extend_from_slice(point);
            (welded.vertices.len() / 3 - 1) as u32
        });
        welded.indices.push(index);
    }

    welded
}

// -0.0 + 0.0 is +0.0
fn weld_key(coordinate: f32) -> u32 {
    (coordinate + 0.0).to_bits()
}
