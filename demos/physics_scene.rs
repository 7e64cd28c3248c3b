//! Physics Scene Demo
//!
//! Builds a small scene with authored physics bodies, saves it, loads it
//! back into a fresh world, attaches every body to the physics world and
//! lets the dynamic ones fall onto the ground.

use scene_engine::prelude::*;
use std::f32::consts::PI;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    scene_engine::init_logging();

    let assets = AssetConfig::default();
    let settings = PhysicsSettings::load_or_default(&assets)?;

    let mut world = World::new();
    info!("Building demo scene...");

    // Ground slab
    world.spawn((
        Transform::from_position(Vec3::new(0.0, -1.0, 0.0)).with_scale(Vec3::new(20.0, 1.0, 20.0)),
        Name::new("ground"),
        PhysicsBody::new(RigidBodyKind::Fixed, ShapeKind::Cube),
        CollisionProxy::new("cube"),
    ));

    // A ring of falling spheres, each under a shared root
    let root = world.spawn((Transform::from_position(Vec3::new(0.0, 4.0, 0.0)), Name::new("ring")));
    for i in 0..4 {
        let angle = (i as f32) * PI * 0.5;
        world.spawn((
            Transform::from_position(Vec3::new(angle.cos() * 3.0, i as f32, angle.sin() * 3.0)),
            Parent(root),
            PhysicsBody::new(RigidBodyKind::Dynamic, ShapeKind::Sphere),
            CollisionProxy::new("sphere"),
        ));
    }

    // Decoration with physics turned off
    let mut disabled = PhysicsBody::new(RigidBodyKind::Dynamic, ShapeKind::Capsule);
    disabled.enabled = false;
    world.spawn((
        Transform::from_position(Vec3::new(5.0, 2.0, 0.0)),
        disabled,
        CollisionProxy::new("cube"),
    ));

    let scene_path = assets.scene_path("physics_demo_generated")?;
    if let Some(dir) = scene_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    info!(path = %scene_path.display(), "Saving scene");
    Scene::from_world(&world).save_to_file(&scene_path)?;

    let mut new_world = World::new();
    let mapper = new_world.load_scene_additive(&scene_path)?;
    info!(entity_count = mapper.len(), "Scene loaded");

    let library = MeshLibrary::new();
    let loader = configure_physics_engine(&settings);
    let physics = ScenePhysics::<RapierWorld>::new(settings);
    let outcomes = pollster::block_on(physics.attach_all(
        loader,
        &mut new_world,
        &library,
        &mapper.entities(),
    ))?;

    for (entity, outcome) in &outcomes {
        if let AttachOutcome::Skipped(reason) = outcome {
            info!(entity = ?entity, reason = ?reason, "Entity has no body");
        }
    }

    for _ in 0..120 {
        physics.step();
    }

    if let Some(hit) = physics.raycast(Vec3::new(0.0, 20.0, 0.0), Vec3::NEG_Y, 100.0, None) {
        let name = new_world
            .get::<Name>(hit.entity)
            .map(|name| name.0.clone())
            .unwrap_or_default();
        info!(entity = ?hit.entity, name = %name, distance = hit.distance, "Ray hit");
    }

    info!(bodies = physics.bound_count(), "Demo completed successfully");
    physics.teardown();

    Ok(())
}
