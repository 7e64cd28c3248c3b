//! Tests for scene physics binding across the loader, assembler and engine

#[cfg(test)]
mod tests {
    use crate::config::PhysicsSettings;
    use crate::core::entity::{Entity, Transform, World};
    use crate::graphics::{Mesh, MeshLibrary};
    use crate::physics::*;
    use futures::channel::oneshot;
    use futures::future::{self, BoxFuture, FutureExt};
    use glam::{Quat, Vec3};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Counters {
        imports: Arc<AtomicUsize>,
        worlds: Arc<AtomicUsize>,
        created: Arc<AtomicUsize>,
        removed: Arc<AtomicUsize>,
    }

    impl Counters {
        fn get(counter: &Arc<AtomicUsize>) -> usize {
            counter.load(Ordering::SeqCst)
        }
    }

    /// Engine double that only counts calls
    struct CountingWorld {
        counters: Counters,
        next_handle: u32,
        descriptors: Vec<RigidBodyDesc>,
    }

    impl PhysicsEngine for CountingWorld {
        type BodyHandle = u32;
        type ColliderHandle = u32;

        fn create_rigid_body(
            &mut self,
            desc: &RigidBodyDesc,
        ) -> Result<BodyHandles<u32, u32>, PhysicsError> {
            self.counters.created.fetch_add(1, Ordering::SeqCst);
            self.next_handle += 1;
            self.descriptors.push(desc.clone());
            Ok(BodyHandles {
                body: self.next_handle,
                collider: Some(self.next_handle + 1000),
            })
        }

        fn remove_rigid_body(&mut self, _body: u32) {
            self.counters.removed.fetch_add(1, Ordering::SeqCst);
        }

        fn raycast(&self, _query: &RaycastQuery<u32>) -> Option<RaycastHit<u32>> {
            None
        }

        fn step(&mut self) {}
    }

    struct CountingModule {
        counters: Counters,
    }

    impl PhysicsModule for CountingModule {
        type World = CountingWorld;

        fn create_world(&self, _settings: &PhysicsSettings) -> CountingWorld {
            self.counters.worlds.fetch_add(1, Ordering::SeqCst);
            CountingWorld {
                counters: self.counters.clone(),
                next_handle: 0,
                descriptors: Vec::new(),
            }
        }
    }

    struct CountingSource {
        counters: Counters,
        fail_next: AtomicBool,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl ModuleSource for CountingSource {
        type Module = CountingModule;

        fn import(&self) -> BoxFuture<'static, Result<CountingModule, EngineLoadError>> {
            self.counters.imports.fetch_add(1, Ordering::SeqCst);
            let counters = self.counters.clone();
            let fail = self.fail_next.swap(false, Ordering::SeqCst);
            let gate = self.gate.lock().unwrap().take();

            async move {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                if fail {
                    return Err(EngineLoadError::Import("engine bundle missing".into()));
                }
                Ok(CountingModule { counters })
            }
            .boxed()
        }

        fn initialize(&self, _module: Arc<CountingModule>) -> BoxFuture<'static, Result<(), EngineLoadError>> {
            future::ready(Ok(())).boxed()
        }
    }

    fn loader(counters: &Counters) -> EngineLoader<CountingSource> {
        EngineLoader::new(
            CountingSource {
                counters: counters.clone(),
                fail_next: AtomicBool::new(false),
                gate: Mutex::new(None),
            },
            EngineInit::Skipped,
        )
    }

    fn gated_loader(counters: &Counters, gate: oneshot::Receiver<()>) -> EngineLoader<CountingSource> {
        let loader = loader(counters);
        *loader.source().gate.lock().unwrap() = Some(gate);
        loader
    }

    fn spawn_body(world: &mut World, body: PhysicsBody, proxy: Option<&str>) -> Entity {
        let entity = world.spawn((Transform::from_position(Vec3::new(0.0, 1.0, 0.0)), body));
        if let Some(mesh) = proxy {
            world.insert_one(entity, CollisionProxy::new(mesh)).unwrap();
        }
        entity
    }

    fn dynamic_cube() -> PhysicsBody {
        PhysicsBody::new(RigidBodyKind::Dynamic, ShapeKind::Cube)
    }

    #[test]
    fn test_attach_creates_world_lazily_and_stores_handles() {
        let counters = Counters::default();
        let loader = loader(&counters);
        let physics = ScenePhysics::<CountingWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let mut world = World::new();
        let a = spawn_body(&mut world, dynamic_cube(), Some("cube"));
        let b = spawn_body(&mut world, dynamic_cube(), Some("sphere"));

        assert!(!physics.has_world());
        let outcome_a = pollster::block_on(physics.attach(&loader, &mut world, &library, a)).unwrap();
        let outcome_b = pollster::block_on(physics.attach(&loader, &mut world, &library, b)).unwrap();

        assert!(outcome_a.is_bound());
        assert!(outcome_b.is_bound());
        assert!(physics.has_world());
        assert_eq!(Counters::get(&counters.imports), 1);
        assert_eq!(Counters::get(&counters.worlds), 1);
        assert_eq!(Counters::get(&counters.created), 2);

        let handles = physics.handles(a).unwrap();
        assert_eq!(handles.collider, Some(handles.body + 1000));
        assert_eq!(physics.entity_for_body(handles.body), Some(a));
        assert_eq!(physics.bound_count(), 2);
    }

    #[test]
    fn test_attaching_twice_is_skipped() {
        let counters = Counters::default();
        let loader = loader(&counters);
        let physics = ScenePhysics::<CountingWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let mut world = World::new();
        let entity = spawn_body(&mut world, dynamic_cube(), Some("cube"));

        pollster::block_on(physics.attach(&loader, &mut world, &library, entity)).unwrap();
        let again = pollster::block_on(physics.attach(&loader, &mut world, &library, entity)).unwrap();

        assert_eq!(again, AttachOutcome::Skipped(SkipReason::AlreadyAttached));
        assert_eq!(Counters::get(&counters.created), 1);
    }

    #[test]
    fn test_disabled_physics_never_touches_engine() {
        let counters = Counters::default();
        let loader = loader(&counters);
        let physics = ScenePhysics::<CountingWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let mut world = World::new();
        let body = PhysicsBody {
            enabled: false,
            ..dynamic_cube()
        };
        let entity = spawn_body(&mut world, body, Some("cube"));

        let outcome = pollster::block_on(physics.attach(&loader, &mut world, &library, entity)).unwrap();

        assert_eq!(outcome, AttachOutcome::Skipped(SkipReason::Disabled));
        assert!(physics.handles(entity).is_none());
        assert!(!physics.detach(entity));
        assert_eq!(Counters::get(&counters.imports), 0);
        assert_eq!(Counters::get(&counters.removed), 0);
    }

    #[test]
    fn test_missing_proxy_is_a_silent_skip() {
        let counters = Counters::default();
        let loader = loader(&counters);
        let physics = ScenePhysics::<CountingWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let mut world = World::new();
        let no_proxy = spawn_body(&mut world, dynamic_cube(), None);
        let unknown_proxy = spawn_body(&mut world, dynamic_cube(), Some("teapot"));
        let no_body = world.spawn((Transform::default(), CollisionProxy::new("cube")));

        let run = |world: &mut World, entity| {
            pollster::block_on(physics.attach(&loader, world, &library, entity)).unwrap()
        };

        assert_eq!(
            run(&mut world, no_proxy),
            AttachOutcome::Skipped(SkipReason::NoCollisionProxy)
        );
        assert_eq!(
            run(&mut world, unknown_proxy),
            AttachOutcome::Skipped(SkipReason::NoCollisionProxy)
        );
        assert_eq!(
            run(&mut world, no_body),
            AttachOutcome::Skipped(SkipReason::NoPhysicsBody)
        );
        assert_eq!(Counters::get(&counters.created), 0);
    }

    #[test]
    fn test_failed_assembly_degrades_without_error() {
        let counters = Counters::default();
        let loader = loader(&counters);
        let physics = ScenePhysics::<CountingWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let mut world = World::new();
        let body = PhysicsBody::with_colliders(
            RigidBodyKind::Dynamic,
            vec![ColliderConfig {
                mesh: Some("not-in-library".into()),
                ..ColliderConfig::new(ShapeKind::Sphere)
            }],
        );
        let entity = spawn_body(&mut world, body, Some("cube"));

        let outcome = pollster::block_on(physics.attach(&loader, &mut world, &library, entity)).unwrap();

        assert!(matches!(outcome, AttachOutcome::Degraded(_)));
        assert!(!physics.is_bound(entity));
        assert!(world.contains(entity));
        assert_eq!(Counters::get(&counters.created), 0);
    }

    #[test]
    fn test_double_detach_removes_once() {
        let counters = Counters::default();
        let loader = loader(&counters);
        let physics = ScenePhysics::<CountingWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let mut world = World::new();
        let entity = spawn_body(&mut world, dynamic_cube(), Some("cube"));
        pollster::block_on(physics.attach(&loader, &mut world, &library, entity)).unwrap();

        assert!(physics.detach(entity));
        assert!(!physics.detach(entity));
        assert_eq!(Counters::get(&counters.removed), 1);
        assert_eq!(physics.bound_count(), 0);
    }

    #[test]
    fn test_teardown_makes_detach_a_no_op() {
        let counters = Counters::default();
        let loader = loader(&counters);
        let physics = ScenePhysics::<CountingWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let mut world = World::new();
        let entity = spawn_body(&mut world, dynamic_cube(), Some("cube"));
        pollster::block_on(physics.attach(&loader, &mut world, &library, entity)).unwrap();

        physics.teardown();

        assert!(!physics.detach(entity));
        assert_eq!(Counters::get(&counters.removed), 0);
        assert!(!physics.step());

        let late = spawn_body(&mut world, dynamic_cube(), Some("cube"));
        let outcome = pollster::block_on(physics.attach(&loader, &mut world, &library, late)).unwrap();
        assert_eq!(outcome, AttachOutcome::Skipped(SkipReason::TornDown));
    }

    #[test]
    fn test_second_world_is_rejected() {
        let counters = Counters::default();
        let module = CountingModule {
            counters: counters.clone(),
        };
        let physics = ScenePhysics::<CountingWorld>::new(PhysicsSettings::default());

        physics.create_world(&module).unwrap();
        assert!(matches!(
            physics.create_world(&module),
            Err(PhysicsError::WorldAlreadyExists)
        ));

        physics.teardown();
        physics.create_world(&module).unwrap();
        assert_eq!(Counters::get(&counters.worlds), 2);
    }

    #[test]
    fn test_detach_during_engine_load_cancels_bind() {
        let counters = Counters::default();
        let (tx, rx) = oneshot::channel();
        let loader = gated_loader(&counters, rx);
        let physics = ScenePhysics::<CountingWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let mut world = World::new();
        let entity = spawn_body(&mut world, dynamic_cube(), Some("cube"));

        let request = match physics.prepare(&mut world, &library, entity) {
            Preparation::Ready(request) => request,
            Preparation::Finished(outcome) => panic!("expected a request, got {outcome:?}"),
        };

        let (outcome, detached) = pollster::block_on(async {
            futures::join!(physics.bind(&loader, request), async {
                let detached = physics.detach(entity);
                let _ = tx.send(());
                detached
            })
        });

        assert_eq!(outcome.unwrap(), AttachOutcome::Cancelled);
        assert!(!detached);
        assert!(physics.handles(entity).is_none());
        assert_eq!(Counters::get(&counters.created), 0);
        assert_eq!(Counters::get(&counters.removed), 0);
    }

    #[test]
    fn test_concurrent_binds_share_one_engine_load() {
        let counters = Counters::default();
        let (tx, rx) = oneshot::channel();
        let loader = gated_loader(&counters, rx);
        let physics = ScenePhysics::<CountingWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let mut world = World::new();
        let a = spawn_body(&mut world, dynamic_cube(), Some("cube"));
        let b = spawn_body(&mut world, dynamic_cube(), Some("cube"));

        let mut requests = Vec::new();
        for entity in [a, b] {
            if let Preparation::Ready(request) = physics.prepare(&mut world, &library, entity) {
                requests.push(request);
            }
        }
        assert_eq!(requests.len(), 2);
        let second = requests.pop().unwrap();
        let first = requests.pop().unwrap();

        let (ra, rb, ()) = pollster::block_on(async {
            futures::join!(physics.bind(&loader, first), physics.bind(&loader, second), async {
                let _ = tx.send(());
            })
        });

        assert!(ra.unwrap().is_bound());
        assert!(rb.unwrap().is_bound());
        assert_eq!(Counters::get(&counters.imports), 1);
        assert_eq!(Counters::get(&counters.worlds), 1);
    }

    #[test]
    fn test_engine_failure_propagates_then_retry_binds() {
        let counters = Counters::default();
        let loader = loader(&counters);
        loader.source().fail_next.store(true, Ordering::SeqCst);
        let physics = ScenePhysics::<CountingWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let mut world = World::new();
        let entity = spawn_body(&mut world, dynamic_cube(), Some("cube"));

        let failed = pollster::block_on(physics.attach(&loader, &mut world, &library, entity));
        assert!(matches!(failed, Err(PhysicsError::EngineUnavailable(_))));
        assert!(!physics.is_bound(entity));
        assert!(!physics.has_world());

        let retried = pollster::block_on(physics.attach(&loader, &mut world, &library, entity)).unwrap();
        assert!(retried.is_bound());
        assert_eq!(Counters::get(&counters.imports), 2);
    }

    #[test]
    fn test_descriptor_reaches_engine_unchanged() {
        let counters = Counters::default();
        let loader = loader(&counters);
        let physics = ScenePhysics::<CountingWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let mut world = World::new();
        let body = PhysicsBody {
            lock_rotation: Some([true, true, true]),
            friction: Some(0.1),
            ..PhysicsBody::new(RigidBodyKind::Player, ShapeKind::Capsule)
        };
        let entity = spawn_body(&mut world, body, Some("cube"));

        pollster::block_on(physics.attach(&loader, &mut world, &library, entity)).unwrap();

        let desc = physics
            .with_world(|w| w.descriptors[0].clone())
            .unwrap();
        assert_eq!(desc.kind, RigidBodyKind::Player);
        assert_eq!(desc.lock_rotation, [true; 3]);
        assert_eq!(desc.colliders[0].material.friction, Some(0.1));
        assert_eq!(desc.colliders[0].shape.kind(), ShapeKind::Capsule);
    }

    #[test]
    fn test_sphere_from_scaled_unit_cube() {
        let mesh = Mesh::cube(1.0);
        let local_radius = mesh.geometry.bounding_sphere().radius;

        let collider = derive_collider(
            ShapeKind::Sphere,
            &ColliderOverrides::default(),
            Vec3::splat(2.0),
            Some(&mesh),
        )
        .unwrap();

        match collider.shape {
            ColliderShape::Sphere { radius } => assert!((radius - local_radius * 2.0).abs() < 1e-5),
            other => panic!("expected sphere, got {other:?}"),
        }
        assert!(collider.position.abs_diff_eq(mesh.transform.position, 1e-6));
    }

    #[test]
    fn test_capsule_from_tall_box() {
        let mesh = Mesh::cuboid(Vec3::new(1.0, 5.0, 1.0));
        let collider = derive_collider(
            ShapeKind::Capsule,
            &ColliderOverrides::default(),
            Vec3::ONE,
            Some(&mesh),
        )
        .unwrap();

        assert_eq!(
            collider.shape,
            ColliderShape::Capsule {
                radius: 0.5,
                height: 4.0
            }
        );
    }

    #[test]
    fn test_rapier_scene_raycast_maps_to_entities() {
        let loader = EngineLoader::new(RapierSource, EngineInit::Auto);
        let physics = ScenePhysics::<RapierWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let mut world = World::new();

        let shooter = world.spawn((
            Transform::default(),
            PhysicsBody::new(RigidBodyKind::Player, ShapeKind::Sphere),
            CollisionProxy::new("cube"),
        ));
        let wall = world.spawn((
            Transform::from_position_rotation(Vec3::new(0.0, 0.0, -5.0), Quat::IDENTITY)
                .with_scale(Vec3::new(4.0, 4.0, 1.0)),
            PhysicsBody::default(),
            CollisionProxy::new("cube"),
        ));

        for entity in [shooter, wall] {
            let outcome =
                pollster::block_on(physics.attach(&loader, &mut world, &library, entity)).unwrap();
            assert!(outcome.is_bound());
        }

        // The ray starts inside the shooter, so ignore it
        let hit = physics
            .raycast(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 50.0, Some(shooter))
            .unwrap();
        assert_eq!(hit.entity, wall);
        assert!((hit.distance - 4.5).abs() < 1e-3);

        assert!(physics.detach(wall));
        assert!(physics
            .raycast(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 50.0, Some(shooter))
            .is_none());
        assert_eq!(physics.with_world(|w| w.body_count()), Some(1));
    }

    #[test]
    fn test_membership_only_groups_still_land_on_ground() {
        let loader = EngineLoader::new(RapierSource, EngineInit::Auto);
        let physics = ScenePhysics::<RapierWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let mut world = World::new();

        let ground = world.spawn((
            Transform::from_position(Vec3::new(0.0, -0.5, 0.0)).with_scale(Vec3::new(20.0, 1.0, 20.0)),
            PhysicsBody::default(),
            CollisionProxy::new("cube"),
        ));
        let authored: PhysicsBody =
            serde_json::from_str(r#"{"kind": "dynamic", "shape": "sphere", "groups": 1}"#).unwrap();
        let ball = world.spawn((
            Transform::from_position(Vec3::new(0.0, 3.0, 0.0)),
            authored,
            CollisionProxy::new("sphere"),
        ));

        for entity in [ground, ball] {
            let outcome =
                pollster::block_on(physics.attach(&loader, &mut world, &library, entity)).unwrap();
            assert!(outcome.is_bound());
        }

        let handles = physics.handles(ball).unwrap();
        let groups = physics
            .with_world(|w| w.collider_set[handles.collider.unwrap()].collision_groups())
            .unwrap();
        assert_eq!(groups.memberships.bits(), 0x0001);
        assert_eq!(groups.filter.bits(), 0xFFFF);

        for _ in 0..240 {
            physics.step();
        }

        let position = physics
            .with_world(|w| w.body_position(handles.body))
            .flatten()
            .unwrap();
        assert!(position.y > 0.3, "ball fell through the ground to {}", position.y);
    }
}
