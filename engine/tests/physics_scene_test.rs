//! Integration test for physics scene loading

use scene_engine::config::{AssetConfig, PhysicsSettings};
use scene_engine::core::entity::{Name, World};
use scene_engine::graphics::MeshLibrary;
use scene_engine::physics::{
    physics_engine, AttachOutcome, PhysicsBody, RapierWorld, ScenePhysics, SkipReason,
};
use glam::Vec3;
use tempfile::TempDir;

const PHYSICS_DEMO: &str = r#"{
    "entities": [
        {
            "components": {
                "Name": "ground",
                "Transform": {"position": [0, -0.5, 0], "rotation": [0, 0, 0, 1], "scale": [20, 1, 20]},
                "PhysicsBody": {"kind": "fixed"},
                "CollisionProxy": {"mesh": "cube"}
            }
        },
        {
            "components": {
                "Name": "ball",
                "Transform": {"position": [0, 5, 0], "rotation": [0, 0, 0, 1], "scale": [1, 1, 1]},
                "PhysicsBody": {"kind": "dynamic", "shape": "sphere", "restitution": 0.0},
                "CollisionProxy": {"mesh": "sphere"}
            }
        },
        {
            "components": {
                "Name": "ghost",
                "Transform": {"position": [3, 5, 0], "rotation": [0, 0, 0, 1], "scale": [1, 1, 1]},
                "PhysicsBody": {"kind": "dynamic", "shape": "sphere"}
            }
        }
    ]
}"#;

fn entity_named(world: &World, name: &str) -> scene_engine::core::entity::Entity {
    world
        .query::<&Name>()
        .iter()
        .find(|(_, n)| n.0 == name)
        .map(|(entity, _)| entity)
        .unwrap()
}

#[test]
fn test_physics_scene_loading() {
    let dir = TempDir::new().unwrap();
    let assets = AssetConfig::new(dir.path().to_path_buf(), "scenes".to_string());
    let scene_path = assets.scene_path("physics_demo").unwrap();
    std::fs::create_dir_all(scene_path.parent().unwrap()).unwrap();
    std::fs::write(&scene_path, PHYSICS_DEMO).unwrap();

    let mut world = World::new();
    let mapper = world.load_scene_additive(&scene_path).expect("Failed to load scene");
    assert_eq!(world.query::<&PhysicsBody>().iter().count(), 3);

    let physics = ScenePhysics::<RapierWorld>::new(PhysicsSettings::default());
    let library = MeshLibrary::new();
    let outcomes = pollster::block_on(physics.attach_all(
        physics_engine(),
        &mut world,
        &library,
        &mapper.entities(),
    ))
    .unwrap();

    let ghost = entity_named(&world, "ghost");
    let skipped: Vec<_> = outcomes
        .iter()
        .filter(|(_, outcome)| !outcome.is_bound())
        .collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].0, ghost);
    assert_eq!(skipped[0].1, AttachOutcome::Skipped(SkipReason::NoCollisionProxy));

    // Let the ball settle on the ground
    for _ in 0..240 {
        physics.step();
    }

    let ball = entity_named(&world, "ball");
    let hit = physics
        .raycast(Vec3::new(0.0, 20.0, 0.0), Vec3::NEG_Y, 100.0, None)
        .expect("ray should hit the ball");
    assert_eq!(hit.entity, ball);
    assert!(hit.point.y < 1.5, "ball should have fallen, top at {}", hit.point.y);

    let ground = entity_named(&world, "ground");
    let below = physics
        .raycast(Vec3::new(0.0, 20.0, 0.0), Vec3::NEG_Y, 100.0, Some(ball))
        .unwrap();
    assert_eq!(below.entity, ground);

    physics.teardown();
    assert!(physics.raycast(Vec3::ZERO, Vec3::NEG_Y, 100.0, None).is_none());
}
