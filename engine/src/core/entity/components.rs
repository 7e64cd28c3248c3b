//! Core components for the entity system

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Transform component representing position, rotation, and scale in local space
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Position in local space
    pub position: Vec3,
    /// Rotation in local space as a quaternion
    pub rotation: Quat,
    /// Scale in local space
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with the given position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with the given position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Convert this transform to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Set the scale of the transform
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

/// Global transform component representing the world-space transformation matrix
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GlobalTransform {
    /// World-space transformation matrix
    pub matrix: Mat4,
}

impl Default for GlobalTransform {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
        }
    }
}

impl GlobalTransform {
    /// Create a new global transform from a matrix
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix }
    }

    /// Get the world position from the transformation matrix
    pub fn position(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }

    /// Split the world matrix into position, unit rotation and scale
    pub fn decompose(&self) -> WorldPose {
        let (scale, rotation, position) = self.matrix.to_scale_rotation_translation();
        WorldPose {
            position,
            rotation: rotation.normalize(),
            scale,
        }
    }
}

/// Resolved world-space pose of an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldPose {
    pub position: Vec3,
    /// Always normalized
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for WorldPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Parent component establishing a parent-child relationship
///
/// Note: hecs::Entity doesn't implement Serialize/Deserialize,
/// so scenes store a [`ParentData`] instead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub hecs::Entity);

/// Serializable data for Parent component
///
/// The entity_id is remapped during scene loading to match the new entity IDs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParentData {
    /// Entity ID that will be remapped during scene loading
    pub entity_id: u64,
}

impl ParentData {
    /// Try to convert ParentData back to Parent using an entity mapper
    pub fn try_to_parent<F>(&self, entity_mapper: F) -> Option<Parent>
    where
        F: Fn(u64) -> Option<hecs::Entity>,
    {
        entity_mapper(self.entity_id).map(Parent)
    }
}

/// Name component for user-friendly entity identification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Name(pub String);

impl Name {
    /// Create a new name component
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}
