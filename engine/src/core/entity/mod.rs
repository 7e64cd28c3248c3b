//! Entity-Component System (ECS) functionality
//!
//! This module provides the scene graph the physics layer binds against:
//! transform components, parent links and hierarchy resolution.

pub mod components;
pub mod hierarchy;
pub mod world;

// Re-export commonly used types
pub use components::{GlobalTransform, Name, Parent, ParentData, Transform, WorldPose};
pub use hierarchy::{refresh_global_transform, update_hierarchy_system, HierarchyError};
pub use world::World;

// Re-export hecs types that users will need
pub use hecs::Entity;
