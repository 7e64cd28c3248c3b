//! Per-scene binding between entities and physics bodies
//!
//! [`ScenePhysics`] owns the scene's single physics world and a side table
//! from entity to engine handles. Attaching is split in two: a synchronous
//! [`ScenePhysics::prepare`] that reads the entity and builds the descriptor,
//! and an asynchronous [`ScenePhysics::bind`] that waits for the engine and
//! creates the body. A detach that lands between the two cancels the bind.
//!
//! Everything here runs on one thread; the `RefCell`s are never borrowed
//! across an await.

use super::components::{CollisionProxy, PhysicsBody};
use super::engine::{BodyHandles, PhysicsEngine, PhysicsModule, RaycastHit, RaycastQuery};
use super::error::PhysicsError;
use super::loader::{EngineLoader, ModuleSource};
use super::rigid_body::{rigid_body_for_entity, RigidBodyDesc};
use crate::config::PhysicsSettings;
use crate::core::entity::{Entity, World};
use crate::graphics::MeshLibrary;
use glam::Vec3;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Why an attach created nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoPhysicsBody,
    Disabled,
    NoCollisionProxy,
    AlreadyAttached,
    TornDown,
}

/// Result of attaching one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome<B, C> {
    /// A body now exists for the entity
    Bound(BodyHandles<B, C>),
    /// Nothing to do; not an error
    Skipped(SkipReason),
    /// Physics setup failed; the entity lives on without a body
    Degraded(String),
    /// The entity was detached before the body could be created
    Cancelled,
}

impl<B, C> AttachOutcome<B, C> {
    pub fn is_bound(&self) -> bool {
        matches!(self, AttachOutcome::Bound(_))
    }
}

/// A descriptor waiting for the engine
#[derive(Debug, Clone)]
pub struct AttachRequest {
    entity: Entity,
    ticket: u64,
    descriptor: RigidBodyDesc,
}

impl AttachRequest {
    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn descriptor(&self) -> &RigidBodyDesc {
        &self.descriptor
    }
}

/// Outcome of the synchronous half of an attach
#[derive(Debug)]
pub enum Preparation<B, C> {
    Ready(AttachRequest),
    Finished(AttachOutcome<B, C>),
}

/// Closest ray hit, mapped back to its entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    pub entity: Entity,
    pub distance: f32,
    pub point: Vec3,
}

enum WorldSlot<W> {
    Empty,
    Active(W),
    TornDown,
}

enum Binding<B, C> {
    Pending(u64),
    Bound(BodyHandles<B, C>),
}

/// Physics state owned by one active scene
pub struct ScenePhysics<W: PhysicsEngine> {
    settings: PhysicsSettings,
    world: RefCell<WorldSlot<W>>,
    bindings: RefCell<HashMap<Entity, Binding<W::BodyHandle, W::ColliderHandle>>>,
    body_to_entity: RefCell<HashMap<W::BodyHandle, Entity>>,
    next_ticket: Cell<u64>,
}

impl<W: PhysicsEngine> ScenePhysics<W> {
    pub fn new(settings: PhysicsSettings) -> Self {
        Self {
            settings,
            world: RefCell::new(WorldSlot::Empty),
            bindings: RefCell::new(HashMap::new()),
            body_to_entity: RefCell::new(HashMap::new()),
            next_ticket: Cell::new(0),
        }
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    /// Whether a world currently exists
    pub fn has_world(&self) -> bool {
        matches!(&*self.world.borrow(), WorldSlot::Active(_))
    }

    pub fn is_torn_down(&self) -> bool {
        matches!(&*self.world.borrow(), WorldSlot::TornDown)
    }

    /// Create the scene's world. Fails while another world exists.
    ///
    /// Creating after a teardown reactivates the scene.
    pub fn create_world<M>(&self, module: &M) -> Result<(), PhysicsError>
    where
        M: PhysicsModule<World = W>,
    {
        let mut slot = self.world.borrow_mut();
        if let WorldSlot::Active(_) = &*slot {
            return Err(PhysicsError::WorldAlreadyExists);
        }
        *slot = WorldSlot::Active(module.create_world(&self.settings));
        info!("Created scene physics world");
        Ok(())
    }

    /// Load the engine if needed and create the world on first use
    pub async fn ensure_world<S>(&self, loader: &EngineLoader<S>) -> Result<(), PhysicsError>
    where
        S: ModuleSource,
        S::Module: PhysicsModule<World = W>,
    {
        match &*self.world.borrow() {
            WorldSlot::Active(_) => return Ok(()),
            WorldSlot::TornDown => return Err(PhysicsError::TornDown),
            WorldSlot::Empty => {}
        }

        let module = loader.load().await?;

        // Another attach may have created it, or the scene died, while we waited
        let mut slot = self.world.borrow_mut();
        match &*slot {
            WorldSlot::Active(_) => Ok(()),
            WorldSlot::TornDown => Err(PhysicsError::TornDown),
            WorldSlot::Empty => {
                *slot = WorldSlot::Active(module.create_world(&self.settings));
                info!("Created scene physics world");
                Ok(())
            }
        }
    }

    /// Read the entity's physics configuration and build its descriptor.
    ///
    /// A `Ready` request reserves the entity: a detach before [`Self::bind`]
    /// finishes cancels it.
    pub fn prepare(
        &self,
        world: &mut World,
        library: &MeshLibrary,
        entity: Entity,
    ) -> Preparation<W::BodyHandle, W::ColliderHandle> {
        if self.is_torn_down() {
            return Preparation::Finished(AttachOutcome::Skipped(SkipReason::TornDown));
        }
        if self.bindings.borrow().contains_key(&entity) {
            return Preparation::Finished(AttachOutcome::Skipped(SkipReason::AlreadyAttached));
        }

        let enabled = match world.get::<PhysicsBody>(entity) {
            Ok(body) => body.enabled,
            Err(_) => {
                return Preparation::Finished(AttachOutcome::Skipped(SkipReason::NoPhysicsBody))
            }
        };
        if !enabled {
            debug!(entity = ?entity, "Physics disabled, skipping attach");
            return Preparation::Finished(AttachOutcome::Skipped(SkipReason::Disabled));
        }

        let has_proxy = world
            .get::<CollisionProxy>(entity)
            .map(|proxy| library.has_mesh(&proxy.mesh))
            .unwrap_or(false);
        if !has_proxy {
            debug!(entity = ?entity, "No collision proxy mesh, skipping attach");
            return Preparation::Finished(AttachOutcome::Skipped(SkipReason::NoCollisionProxy));
        }

        let descriptor = match rigid_body_for_entity(world, entity, library) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                warn!(entity = ?entity, "Physics setup failed, continuing without a body: {}", err);
                return Preparation::Finished(AttachOutcome::Degraded(err.to_string()));
            }
        };

        let ticket = self.next_ticket.get() + 1;
        self.next_ticket.set(ticket);
        self.bindings
            .borrow_mut()
            .insert(entity, Binding::Pending(ticket));

        Preparation::Ready(AttachRequest {
            entity,
            ticket,
            descriptor,
        })
    }

    /// Wait for the engine and create the prepared body.
    ///
    /// Engine load failures are returned; the entity is left unbound and may
    /// be attached again later.
    pub async fn bind<S>(
        &self,
        loader: &EngineLoader<S>,
        request: AttachRequest,
    ) -> Result<AttachOutcome<W::BodyHandle, W::ColliderHandle>, PhysicsError>
    where
        S: ModuleSource,
        S::Module: PhysicsModule<World = W>,
    {
        let AttachRequest {
            entity,
            ticket,
            descriptor,
        } = request;

        match self.ensure_world(loader).await {
            Ok(()) => {}
            Err(PhysicsError::TornDown) => return Ok(AttachOutcome::Cancelled),
            Err(err) => {
                self.release_ticket(entity, ticket);
                return Err(err);
            }
        }

        if !self.holds_ticket(entity, ticket) {
            debug!(entity = ?entity, "Entity detached while its body was pending");
            return Ok(AttachOutcome::Cancelled);
        }

        let created = match &mut *self.world.borrow_mut() {
            WorldSlot::Active(world) => world.create_rigid_body(&descriptor),
            _ => return Ok(AttachOutcome::Cancelled),
        };

        match created {
            Ok(handles) => {
                self.bindings
                    .borrow_mut()
                    .insert(entity, Binding::Bound(handles));
                self.body_to_entity
                    .borrow_mut()
                    .insert(handles.body, entity);
                debug!(entity = ?entity, body = ?handles.body, "Bound physics body");
                Ok(AttachOutcome::Bound(handles))
            }
            Err(err) => {
                self.release_ticket(entity, ticket);
                warn!(entity = ?entity, "Engine rejected physics body: {}", err);
                Ok(AttachOutcome::Degraded(err.to_string()))
            }
        }
    }

    /// Prepare and bind in one call
    pub async fn attach<S>(
        &self,
        loader: &EngineLoader<S>,
        world: &mut World,
        library: &MeshLibrary,
        entity: Entity,
    ) -> Result<AttachOutcome<W::BodyHandle, W::ColliderHandle>, PhysicsError>
    where
        S: ModuleSource,
        S::Module: PhysicsModule<World = W>,
    {
        match self.prepare(world, library, entity) {
            Preparation::Ready(request) => self.bind(loader, request).await,
            Preparation::Finished(outcome) => Ok(outcome),
        }
    }

    /// Attach each entity in turn, stopping at the first engine failure
    pub async fn attach_all<S>(
        &self,
        loader: &EngineLoader<S>,
        world: &mut World,
        library: &MeshLibrary,
        entities: &[Entity],
    ) -> Result<Vec<(Entity, AttachOutcome<W::BodyHandle, W::ColliderHandle>)>, PhysicsError>
    where
        S: ModuleSource,
        S::Module: PhysicsModule<World = W>,
    {
        let mut outcomes = Vec::with_capacity(entities.len());
        for &entity in entities {
            let outcome = self.attach(loader, world, library, entity).await?;
            outcomes.push((entity, outcome));
        }

        let bound = outcomes.iter().filter(|(_, o)| o.is_bound()).count();
        info!(attached = bound, total = entities.len(), "Attached scene physics");
        Ok(outcomes)
    }

    /// Forget the entity's body, removing it from the engine if it exists.
    ///
    /// Returns whether the engine was asked to remove anything. Safe to call
    /// repeatedly and after teardown.
    pub fn detach(&self, entity: Entity) -> bool {
        let binding = self.bindings.borrow_mut().remove(&entity);

        match binding {
            None => false,
            Some(Binding::Pending(_)) => {
                debug!(entity = ?entity, "Cancelled pending physics attach");
                false
            }
            Some(Binding::Bound(handles)) => {
                self.body_to_entity.borrow_mut().remove(&handles.body);
                match &mut *self.world.borrow_mut() {
                    WorldSlot::Active(world) => {
                        world.remove_rigid_body(handles.body);
                        debug!(entity = ?entity, body = ?handles.body, "Removed physics body");
                        true
                    }
                    _ => false,
                }
            }
        }
    }

    /// Engine handles bound to an entity
    pub fn handles(&self, entity: Entity) -> Option<BodyHandles<W::BodyHandle, W::ColliderHandle>> {
        match self.bindings.borrow().get(&entity) {
            Some(Binding::Bound(handles)) => Some(*handles),
            _ => None,
        }
    }

    pub fn is_bound(&self, entity: Entity) -> bool {
        self.handles(entity).is_some()
    }

    /// Entity owning an engine body
    pub fn entity_for_body(&self, body: W::BodyHandle) -> Option<Entity> {
        self.body_to_entity.borrow().get(&body).copied()
    }

    /// Number of entities with a live body
    pub fn bound_count(&self) -> usize {
        self.body_to_entity.borrow().len()
    }

    /// Cast a ray, optionally passing through one entity's body
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        ignore: Option<Entity>,
    ) -> Option<SceneHit> {
        let mut query = RaycastQuery::new(origin, direction, max_distance);
        if let Some(body) = ignore.and_then(|entity| self.handles(entity)).map(|h| h.body) {
            query = query.ignoring(body);
        }

        let hit: RaycastHit<W::BodyHandle> = match &*self.world.borrow() {
            WorldSlot::Active(world) => world.raycast(&query)?,
            _ => return None,
        };

        Some(SceneHit {
            entity: self.entity_for_body(hit.body)?,
            distance: hit.distance,
            point: hit.point,
        })
    }

    /// Run a closure against the live world
    pub fn with_world<R>(&self, f: impl FnOnce(&mut W) -> R) -> Option<R> {
        match &mut *self.world.borrow_mut() {
            WorldSlot::Active(world) => Some(f(world)),
            _ => None,
        }
    }

    /// Advance the world by one step, if there is one
    pub fn step(&self) -> bool {
        self.with_world(|world| world.step()).is_some()
    }

    /// Drop the world and every binding. Later detaches do nothing and later
    /// attaches are skipped until a new world is created.
    pub fn teardown(&self) {
        let bound = self.bindings.borrow().len();
        self.bindings.borrow_mut().clear();
        self.body_to_entity.borrow_mut().clear();
        *self.world.borrow_mut() = WorldSlot::TornDown;
        info!(bindings = bound, "Tore down scene physics");
    }

    fn holds_ticket(&self, entity: Entity, ticket: u64) -> bool {
        matches!(self.bindings.borrow().get(&entity), Some(Binding::Pending(t)) if *t == ticket)
    }

    fn release_ticket(&self, entity: Entity, ticket: u64) {
        if self.holds_ticket(entity, ticket) {
            self.bindings.borrow_mut().remove(&entity);
        }
    }
}
