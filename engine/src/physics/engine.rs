//! Seams between the scene binder and a physics engine backend

use super::error::PhysicsError;
use super::rigid_body::RigidBodyDesc;
use crate::config::PhysicsSettings;
use glam::Vec3;
use std::fmt::Debug;
use std::hash::Hash;

/// Handles returned when a body is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyHandles<B, C> {
    pub body: B,
    /// First collider attached to the body
    pub collider: Option<C>,
}

/// Ray query in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastQuery<B> {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_distance: f32,
    /// Body the ray should pass through, typically the caster's own
    pub ignore: Option<B>,
}

impl<B> RaycastQuery<B> {
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction,
            max_distance,
            ignore: None,
        }
    }

    pub fn ignoring(mut self, body: B) -> Self {
        self.ignore = Some(body);
        self
    }
}

/// Closest hit of a ray query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit<B> {
    pub body: B,
    pub distance: f32,
    pub point: Vec3,
}

/// One simulation world
pub trait PhysicsEngine {
    type BodyHandle: Copy + Eq + Hash + Debug;
    type ColliderHandle: Copy + Eq + Debug;

    /// Create a body with every collider in the descriptor attached
    fn create_rigid_body(
        &mut self,
        desc: &RigidBodyDesc,
    ) -> Result<BodyHandles<Self::BodyHandle, Self::ColliderHandle>, PhysicsError>;

    /// Remove a body and its colliders
    fn remove_rigid_body(&mut self, body: Self::BodyHandle);

    fn raycast(&self, query: &RaycastQuery<Self::BodyHandle>) -> Option<RaycastHit<Self::BodyHandle>>;

    /// Advance the simulation by one fixed timestep
    fn step(&mut self);
}

/// A loaded engine module that can create worlds
pub trait PhysicsModule: Send + Sync + 'static {
    type World: PhysicsEngine;

    fn create_world(&self, settings: &PhysicsSettings) -> Self::World;
}
