//! Scene serialization and loading
//!
//! Scenes are JSON lists of entities, each a map from component name to
//! value. Parent links are stored as scene-local indices and remapped on load.

use crate::core::entity::{Entity, Name, Parent, ParentData, Transform, World};
use crate::physics::{CollisionProxy, PhysicsBody};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Scene data structure containing serialized entities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub entities: Vec<SerializedEntity>,
}

/// A single serialized entity with its components
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerializedEntity {
    /// Map of component type names to their serialized JSON values
    pub components: HashMap<String, serde_json::Value>,
}

/// Errors that can occur during scene operations
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Component error: {0}")]
    Component(String),
}

/// Scene-local index to spawned entity, filled while instantiating
#[derive(Debug, Default)]
pub struct EntityMapper {
    mapping: HashMap<u64, Entity>,
}

impl EntityMapper {
    pub fn register(&mut self, scene_id: u64, entity: Entity) {
        self.mapping.insert(scene_id, entity);
    }

    /// Entity spawned for a scene-local index
    pub fn remap(&self, scene_id: u64) -> Option<Entity> {
        self.mapping.get(&scene_id).copied()
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Spawned entities in scene order
    pub fn entities(&self) -> Vec<Entity> {
        let mut pairs: Vec<_> = self.mapping.iter().map(|(&id, &e)| (id, e)).collect();
        pairs.sort_by_key(|(id, _)| *id);
        pairs.into_iter().map(|(_, entity)| entity).collect()
    }
}

impl SerializedEntity {
    fn capture<T>(&mut self, world: &World, entity: Entity, name: &str)
    where
        T: hecs::Component + Serialize,
    {
        let Ok(component) = world.get::<T>(entity) else {
            return;
        };
        match serde_json::to_value(&*component) {
            Ok(value) => {
                self.components.insert(name.to_string(), value);
            }
            Err(e) => error!(error = %e, component = name, "Failed to serialize component"),
        }
    }

    fn capture_parent(&mut self, data: ParentData) {
        match serde_json::to_value(data) {
            Ok(value) => {
                self.components.insert("Parent".to_string(), value);
            }
            Err(e) => error!(error = %e, "Failed to serialize Parent"),
        }
    }
}

fn insert_component<T>(world: &mut World, entity: Entity, name: &str, value: &serde_json::Value)
where
    T: hecs::Component + DeserializeOwned,
{
    match serde_json::from_value::<T>(value.clone()) {
        Ok(component) => {
            if let Err(e) = world.insert_one(entity, component) {
                error!(error = ?e, entity = ?entity, component = name, "Failed to insert component");
            }
        }
        Err(e) => error!(error = %e, component = name, "Failed to deserialize component"),
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture every entity of the world with its serializable components
    pub fn from_world(world: &World) -> Self {
        let order: Vec<Entity> = world.query::<()>().iter().map(|(entity, ())| entity).collect();
        let entity_to_id: HashMap<Entity, u64> = order
            .iter()
            .enumerate()
            .map(|(id, &entity)| (entity, id as u64))
            .collect();

        let entities = order
            .into_iter()
            .map(|entity| {
                let mut serialized = SerializedEntity::default();
                serialized.capture::<Transform>(world, entity, "Transform");
                serialized.capture::<Name>(world, entity, "Name");
                serialized.capture::<PhysicsBody>(world, entity, "PhysicsBody");
                serialized.capture::<CollisionProxy>(world, entity, "CollisionProxy");

                if let Ok(parent) = world.get::<Parent>(entity) {
                    match entity_to_id.get(&parent.0) {
                        Some(&entity_id) => {
                            serialized.capture_parent(ParentData { entity_id });
                        }
                        None => warn!(entity = ?entity, parent = ?parent.0, "Parent entity not found in scene"),
                    }
                }
                serialized
            })
            .collect::<Vec<_>>();

        info!(entity_count = entities.len(), "Created scene from world");
        Scene { entities }
    }

    /// Spawn this scene's entities into a world, keeping what is already there
    pub fn instantiate(&self, world: &mut World) -> Result<EntityMapper, SceneError> {
        let mut mapper = EntityMapper::default();

        info!(entity_count = self.entities.len(), "Instantiating scene");

        // Spawn first so parents can be remapped regardless of order
        for id in 0..self.entities.len() {
            let entity = world.spawn(());
            mapper.register(id as u64, entity);
        }

        for (id, serialized) in self.entities.iter().enumerate() {
            let entity = mapper
                .remap(id as u64)
                .ok_or_else(|| SceneError::Component(format!("entity {id} was not spawned")))?;

            for (component_type, value) in &serialized.components {
                match component_type.as_str() {
                    "Transform" => insert_component::<Transform>(world, entity, component_type, value),
                    "Name" => insert_component::<Name>(world, entity, component_type, value),
                    "PhysicsBody" => {
                        insert_component::<PhysicsBody>(world, entity, component_type, value)
                    }
                    "CollisionProxy" => {
                        insert_component::<CollisionProxy>(world, entity, component_type, value)
                    }
                    "Parent" => match serde_json::from_value::<ParentData>(value.clone()) {
                        Ok(data) => match data.try_to_parent(|id| mapper.remap(id)) {
                            Some(parent) => {
                                let _ = world.insert_one(entity, parent);
                            }
                            None => warn!(
                                parent_id = data.entity_id,
                                "Parent entity not found in scene during instantiation"
                            ),
                        },
                        Err(e) => error!(error = %e, "Failed to deserialize Parent"),
                    },
                    unknown => {
                        warn!(component_type = unknown, "Unknown component type in scene, skipping");
                    }
                }
            }
            debug!(id, entity = ?entity, "Instantiated entity");
        }

        info!("Scene instantiation complete");
        Ok(mapper)
    }

    /// Save this scene to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = ?path, "Scene saved");
        Ok(())
    }

    /// Load a scene from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let scene = serde_json::from_str(&json)?;
        info!(path = ?path, "Scene loaded");
        Ok(scene)
    }
}
