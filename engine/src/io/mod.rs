//! Scene serialization

mod scene;

pub use scene::{EntityMapper, Scene, SceneError, SerializedEntity};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsSettings;
    use crate::core::entity::{Name, Parent, Transform, World};
    use crate::graphics::MeshLibrary;
    use crate::physics::{
        CollisionProxy, EngineInit, EngineLoader, PhysicsBody, RapierSource, RapierWorld,
        RigidBodyKind, ScenePhysics, ShapeKind,
    };
    use glam::Vec3;
    use tempfile::TempDir;

    #[test]
    fn test_scene_round_trip_keeps_physics_components() {
        let mut world = World::new();
        let parent = world.spawn((
            Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
            Name::new("crate"),
        ));
        let _child = world.spawn((
            Transform::from_position(Vec3::X),
            Parent(parent),
            PhysicsBody::new(RigidBodyKind::Dynamic, ShapeKind::Sphere),
            CollisionProxy::new("sphere"),
        ));

        let scene = Scene::from_world(&world);
        let mut new_world = World::new();
        let mapper = scene.instantiate(&mut new_world).unwrap();

        assert_eq!(new_world.query::<()>().iter().count(), 2);
        let new_parent = mapper.remap(0).unwrap();
        let new_child = mapper.remap(1).unwrap();

        assert_eq!(new_world.get::<Parent>(new_child).unwrap().0, new_parent);
        assert_eq!(new_world.get::<Name>(new_parent).unwrap().0, "crate");
        assert_eq!(
            new_world.get::<PhysicsBody>(new_child).unwrap().shape,
            ShapeKind::Sphere
        );
        assert_eq!(
            new_world.get::<CollisionProxy>(new_child).unwrap().mesh,
            "sphere"
        );
    }

    #[test]
    fn test_unknown_component_is_skipped() {
        let json = r#"{
            "entities": [{
                "components": {
                    "Transform": {"position":[0,0,0],"rotation":[0,0,0,1],"scale":[1,1,1]},
                    "UnknownComponent": {"data": "ignored"}
                }
            }]
        }"#;

        let scene: Scene = serde_json::from_str(json).unwrap();
        let mut world = World::new();

        assert!(scene.instantiate(&mut world).is_ok());
        assert_eq!(world.query::<&Transform>().iter().count(), 1);
    }

    #[test]
    fn test_authored_physics_json() {
        let json = r#"{
            "entities": [{
                "components": {
                    "Transform": {"position":[0,4,0],"rotation":[0,0,0,1],"scale":[1,1,1]},
                    "PhysicsBody": {"kind": "DYNAMIC", "shape": "Capsule", "lockOrientation": [true, false, true]},
                    "CollisionProxy": {"mesh": "cube"}
                }
            }]
        }"#;

        let scene: Scene = serde_json::from_str(json).unwrap();
        let mut world = World::new();
        let mapper = scene.instantiate(&mut world).unwrap();
        let entity = mapper.remap(0).unwrap();

        let body = world.get::<PhysicsBody>(entity).unwrap();
        assert_eq!(body.kind, RigidBodyKind::Dynamic);
        assert_eq!(body.shape, ShapeKind::Capsule);
        assert_eq!(body.lock_rotation, Some([true, false, true]));
    }

    #[test]
    fn test_additive_loading_then_attach() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("level.json");

        let mut authored = World::new();
        authored.spawn((
            Transform::from_position(Vec3::new(0.0, -1.0, 0.0)).with_scale(Vec3::new(10.0, 1.0, 10.0)),
            PhysicsBody::default(),
            CollisionProxy::new("cube"),
        ));
        authored.spawn((
            Transform::from_position(Vec3::new(0.0, 3.0, 0.0)),
            PhysicsBody::new(RigidBodyKind::Dynamic, ShapeKind::Sphere),
            CollisionProxy::new("sphere"),
        ));
        authored.spawn((Transform::default(), Name::new("marker")));
        Scene::from_world(&authored).save_to_file(&path).unwrap();

        let mut world = World::new();
        let existing = world.spawn((Transform::from_position(Vec3::Y),));
        let mapper = world.load_scene_additive(&path).unwrap();

        assert_eq!(mapper.len(), 3);
        assert!(world.contains(existing));

        let loader = EngineLoader::new(RapierSource, EngineInit::Auto);
        let physics = ScenePhysics::<RapierWorld>::new(PhysicsSettings::default());
        let library = MeshLibrary::new();
        let outcomes = pollster::block_on(physics.attach_all(
            &loader,
            &mut world,
            &library,
            &mapper.entities(),
        ))
        .unwrap();

        assert_eq!(outcomes.iter().filter(|(_, o)| o.is_bound()).count(), 2);
        assert_eq!(physics.bound_count(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = Scene::load_from_file(dir.path().join("absent.json"));
        assert!(matches!(result, Err(SceneError::Io(_))));
    }
}
