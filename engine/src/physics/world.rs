//! Rapier backend for the physics engine seam
//!
//! [`RapierWorld`] wraps every Rapier structure needed to simulate one scene.
//! [`RapierSource`] feeds the process-wide loader returned by
//! [`physics_engine`].

use super::collider::{ColliderDesc, ColliderShape};
use super::components::RigidBodyKind;
use super::engine::{BodyHandles, PhysicsEngine, PhysicsModule, RaycastHit, RaycastQuery};
use super::error::PhysicsError;
use super::loader::{EngineInit, EngineLoadError, EngineLoader, ModuleSource};
use super::rigid_body::RigidBodyDesc;
use crate::config::PhysicsSettings;
use futures::future::{self, BoxFuture, FutureExt};
use glam::{Quat, Vec3};
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Physics world resource containing all Rapier structures
pub struct RapierWorld {
    /// Set of rigid bodies in the simulation
    pub rigid_body_set: RigidBodySet,

    /// Set of colliders in the simulation
    pub collider_set: ColliderSet,

    /// Integration parameters for the simulation
    pub integration_parameters: IntegrationParameters,

    /// Physics pipeline for stepping the simulation
    pub physics_pipeline: PhysicsPipeline,

    pub island_manager: IslandManager,
    pub broad_phase: BroadPhaseMultiSap,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,

    /// Gravity vector for the simulation
    pub gravity: Vector<Real>,

    /// Query pipeline for raycasts
    pub query_pipeline: QueryPipeline,
}

impl RapierWorld {
    pub fn new(settings: &PhysicsSettings) -> Self {
        info!(
            gravity = ?settings.gravity,
            timestep = settings.timestep,
            "Initializing physics world"
        );

        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = settings.timestep;

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: to_vector(settings.gravity),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Number of bodies currently simulated
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Number of colliders currently simulated
    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    /// World translation of a body
    pub fn body_position(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(handle).map(|body| {
            let t = body.translation();
            Vec3::new(t.x, t.y, t.z)
        })
    }
}

impl PhysicsEngine for RapierWorld {
    type BodyHandle = RigidBodyHandle;
    type ColliderHandle = ColliderHandle;

    fn create_rigid_body(
        &mut self,
        desc: &RigidBodyDesc,
    ) -> Result<BodyHandles<RigidBodyHandle, ColliderHandle>, PhysicsError> {
        // Build every collider before touching the sets so a bad one leaves no trace
        let builders = desc
            .colliders
            .iter()
            .map(collider_builder)
            .collect::<Result<Vec<_>, _>>()?;

        let body = RigidBodyBuilder::new(body_type(desc.kind))
            .position(isometry(desc.position, desc.rotation))
            .locked_axes(locked_axes(desc.lock_translation, desc.lock_rotation))
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        let colliders: Vec<ColliderHandle> = builders
            .into_iter()
            .map(|builder| {
                self.collider_set
                    .insert_with_parent(builder, body_handle, &mut self.rigid_body_set)
            })
            .collect();

        self.query_pipeline.update(&self.collider_set);

        debug!(
            body = ?body_handle,
            kind = %desc.kind,
            colliders = colliders.len(),
            "Created rigid body"
        );

        Ok(BodyHandles {
            body: body_handle,
            collider: colliders.first().copied(),
        })
    }

    fn remove_rigid_body(&mut self, body: RigidBodyHandle) {
        let removed = self.rigid_body_set.remove(
            body,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true, // Also remove attached colliders
        );

        if removed.is_some() {
            self.query_pipeline.update(&self.collider_set);
            debug!(body = ?body, "Removed rigid body");
        }
    }

    fn raycast(&self, query: &RaycastQuery<RigidBodyHandle>) -> Option<RaycastHit<RigidBodyHandle>> {
        let direction = query.direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        let ray = Ray::new(
            Point::new(query.origin.x, query.origin.y, query.origin.z),
            to_vector(direction),
        );
        let mut filter = QueryFilter::default();
        if let Some(ignore) = query.ignore {
            filter = filter.exclude_rigid_body(ignore);
        }

        let (collider, distance) = self.query_pipeline.cast_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            query.max_distance,
            true,
            filter,
        )?;
        let body = self.collider_set.get(collider)?.parent()?;

        Some(RaycastHit {
            body,
            distance,
            point: query.origin + direction * distance,
        })
    }

    fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }
}

/// The loaded Rapier module
#[derive(Debug, Default)]
pub struct RapierModule;

impl PhysicsModule for RapierModule {
    type World = RapierWorld;

    fn create_world(&self, settings: &PhysicsSettings) -> RapierWorld {
        RapierWorld::new(settings)
    }
}

/// Source of the Rapier module. Rapier is linked statically, so import and
/// init complete immediately.
#[derive(Debug, Default)]
pub struct RapierSource;

impl ModuleSource for RapierSource {
    type Module = RapierModule;

    fn import(&self) -> BoxFuture<'static, Result<RapierModule, EngineLoadError>> {
        future::ready(Ok(RapierModule)).boxed()
    }

    fn initialize(&self, _module: Arc<RapierModule>) -> BoxFuture<'static, Result<(), EngineLoadError>> {
        debug!("Rapier needs no runtime initialization");
        future::ready(Ok(())).boxed()
    }
}

static ENGINE: OnceLock<EngineLoader<RapierSource>> = OnceLock::new();

/// Process-wide physics engine loader
pub fn physics_engine() -> &'static EngineLoader<RapierSource> {
    ENGINE.get_or_init(|| EngineLoader::new(RapierSource, EngineInit::Auto))
}

/// Process-wide loader, created from `settings` if nothing created it yet.
///
/// The first configuration wins; a later mismatch is only logged.
pub fn configure_physics_engine(settings: &PhysicsSettings) -> &'static EngineLoader<RapierSource> {
    let loader = ENGINE.get_or_init(|| EngineLoader::from_settings(RapierSource, settings));
    if loader.init() != settings.engine_init {
        warn!(
            configured = ?loader.init(),
            requested = ?settings.engine_init,
            "Physics engine loader already configured"
        );
    }
    loader
}

fn body_type(kind: RigidBodyKind) -> RigidBodyType {
    match kind {
        RigidBodyKind::Dynamic => RigidBodyType::Dynamic,
        RigidBodyKind::Fixed => RigidBodyType::Fixed,
        RigidBodyKind::Kinematic | RigidBodyKind::Player => RigidBodyType::KinematicPositionBased,
    }
}

fn locked_axes(translation: [bool; 3], rotation: [bool; 3]) -> LockedAxes {
    let flags = [
        (translation[0], LockedAxes::TRANSLATION_LOCKED_X),
        (translation[1], LockedAxes::TRANSLATION_LOCKED_Y),
        (translation[2], LockedAxes::TRANSLATION_LOCKED_Z),
        (rotation[0], LockedAxes::ROTATION_LOCKED_X),
        (rotation[1], LockedAxes::ROTATION_LOCKED_Y),
        (rotation[2], LockedAxes::ROTATION_LOCKED_Z),
    ];

    flags
        .into_iter()
        .filter(|(locked, _)| *locked)
        .fold(LockedAxes::empty(), |axes, (_, flag)| axes | flag)
}

fn collider_builder(desc: &ColliderDesc) -> Result<ColliderBuilder, PhysicsError> {
    let builder = match &desc.shape {
        ColliderShape::Cube {
            width,
            height,
            depth,
        } => ColliderBuilder::cuboid(width * 0.5, height * 0.5, depth * 0.5),
        ColliderShape::Sphere { radius } => ColliderBuilder::ball(*radius),
        ColliderShape::Capsule { radius, height } => ColliderBuilder::capsule_y(height * 0.5, *radius),
        ColliderShape::Cylinder { radius, height } => ColliderBuilder::cylinder(height * 0.5, *radius),
        ColliderShape::Mesh { vertices, indices } => trimesh_builder(vertices, indices)?,
    };

    let mut builder = builder
        .translation(to_vector(desc.position))
        .sensor(desc.sensor);

    if let Some(friction) = desc.material.friction {
        builder = builder.friction(friction);
    }
    if let Some(restitution) = desc.material.restitution {
        builder = builder.restitution(restitution);
    }
    if let Some(density) = desc.material.density {
        builder = builder.density(density);
    }
    if let Some(mass) = desc.material.mass {
        builder = builder.mass(mass);
    }
    if let Some(groups) = desc.groups {
        builder = builder.collision_groups(InteractionGroups::new(
            Group::from_bits_truncate(groups.memberships() as u32),
            Group::from_bits_truncate(groups.filter() as u32),
        ));
    }

    Ok(builder)
}

fn trimesh_builder(vertices: &[f32], indices: &[u32]) -> Result<ColliderBuilder, PhysicsError> {
    let vertex_count = vertices.len() / 3;
    if indices.len() % 3 != 0 || indices.iter().any(|&i| i as usize >= vertex_count) {
        return Err(PhysicsError::InvalidGeometry(format!(
            "{} indices do not form triangles over {} vertices",
            indices.len(),
            vertex_count
        )));
    }

    let points: Vec<Point<Real>> = vertices
        .chunks_exact(3)
        .map(|p| Point::new(p[0], p[1], p[2]))
        .collect();
    let triangles: Vec<[u32; 3]> = indices
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .collect();

    ColliderBuilder::trimesh(points, triangles)
        .map_err(|err| PhysicsError::InvalidGeometry(format!("{:?}", err)))
}

fn isometry(position: Vec3, rotation: Quat) -> Isometry3<Real> {
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(
        rotation.w, rotation.x, rotation.y, rotation.z,
    ));
    Isometry3::from_parts(Translation3::new(position.x, position.y, position.z), rotation)
}

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}
