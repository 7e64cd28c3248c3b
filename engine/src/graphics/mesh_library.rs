//! Named mesh registry used to resolve collision proxies

use crate::graphics::mesh::Mesh;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Mesh library with predefined primitives and user-registered meshes
pub struct MeshLibrary {
    meshes: HashMap<String, Arc<Mesh>>,
}

impl Default for MeshLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshLibrary {
    /// Create a new mesh library with the default primitives
    pub fn new() -> Self {
        let mut library = Self::empty();

        library.register("cube", Mesh::cube(1.0));
        library.register("sphere", Mesh::sphere(0.5, 32, 16));
        library.register("plane", Mesh::plane(2.0, 2.0));

        debug!(
            "Initialized mesh library with {} default meshes",
            library.meshes.len()
        );

        library
    }

    /// Create a library without any primitives
    pub fn empty() -> Self {
        Self {
            meshes: HashMap::new(),
        }
    }

    /// Register a mesh, replacing any previous mesh of that name
    pub fn register(&mut self, name: &str, mesh: Mesh) {
        self.meshes.insert(name.to_string(), Arc::new(mesh));
        debug!(mesh_name = name, "Registered mesh");
    }

    /// Look up a mesh by name
    pub fn get(&self, name: &str) -> Option<Arc<Mesh>> {
        self.meshes.get(name).cloned()
    }

    /// Check if a mesh is available
    pub fn has_mesh(&self, name: &str) -> bool {
        self.meshes.contains_key(name)
    }
}
