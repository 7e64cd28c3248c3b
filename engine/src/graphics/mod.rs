//! Graphics module
//!
//! Renderable mesh data: geometry buffers, bounding volumes, primitive
//! generators and the named mesh library.

pub mod bounding;
pub mod mesh;
pub mod mesh_library;

// Re-export commonly used types
pub use bounding::{Aabb, BoundingSphere};
pub use mesh::{Geometry, Mesh};
pub use mesh_library::MeshLibrary;
