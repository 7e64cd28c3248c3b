//! Hierarchy system for updating global transforms based on parent relationships

use super::components::{GlobalTransform, Parent, Transform};
use super::world::World;
use glam::Mat4;
use hecs::Entity;
use std::collections::HashSet;
use tracing::{error, trace};

/// Errors raised while resolving a single entity's world matrix
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error("entity {0:?} does not exist")]
    NoSuchEntity(Entity),

    #[error("cyclic parent chain detected at entity {0:?}")]
    Cycle(Entity),
}

/// Update the hierarchy, calculating global transforms from local transforms
/// and parent relationships using breadth-first traversal.
pub fn update_hierarchy_system(world: &mut World) {
    let mut queue = Vec::with_capacity(1024);
    let mut visited = HashSet::with_capacity(1024);
    let mut next_level = Vec::new();

    let inner = world.inner_mut();

    // Roots are entities with a Transform and no Parent
    let mut root_updates = Vec::new();
    for (entity, transform) in inner.query::<&Transform>().without::<&Parent>().iter() {
        root_updates.push((entity, transform.to_matrix()));
        visited.insert(entity);
    }

    for (entity, world_matrix) in &root_updates {
        write_global(inner, *entity, *world_matrix);
    }

    queue.extend(root_updates);
    trace!(root_count = queue.len(), "Starting hierarchy update");

    while !queue.is_empty() {
        let mut child_updates = Vec::new();

        for (parent_entity, parent_world_matrix) in queue.drain(..) {
            for (child_entity, (parent, transform)) in
                inner.query::<(&Parent, &Transform)>().iter()
            {
                if parent.0 != parent_entity {
                    continue;
                }

                if visited.contains(&child_entity) {
                    error!(
                        parent = ?parent_entity,
                        child = ?child_entity,
                        "Cyclic parent-child relationship detected in hierarchy"
                    );
                    continue;
                }

                visited.insert(child_entity);

                let child_world_matrix = parent_world_matrix * transform.to_matrix();
                child_updates.push((child_entity, child_world_matrix));
                next_level.push((child_entity, child_world_matrix));
            }
        }

        for (child_entity, child_world_matrix) in child_updates {
            write_global(inner, child_entity, child_world_matrix);
        }

        std::mem::swap(&mut queue, &mut next_level);
    }

    trace!(processed_count = visited.len(), "Hierarchy update completed");
}

/// Recompute one entity's world matrix from its parent chain and store it.
///
/// Pending local edits anywhere up the chain are picked up, so the returned
/// matrix never lags behind the latest transforms. Ancestors without a
/// Transform contribute identity.
pub fn refresh_global_transform(world: &mut World, entity: Entity) -> Result<Mat4, HierarchyError> {
    if !world.contains(entity) {
        return Err(HierarchyError::NoSuchEntity(entity));
    }

    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = Some(entity);

    while let Some(current) = cursor {
        if !seen.insert(current) {
            error!(entity = ?current, "Cyclic parent chain while refreshing world matrix");
            return Err(HierarchyError::Cycle(current));
        }
        let local = world
            .get::<Transform>(current)
            .map(|transform| transform.to_matrix())
            .unwrap_or(Mat4::IDENTITY);
        chain.push(local);
        cursor = world.get::<Parent>(current).ok().map(|parent| parent.0);
    }

    // Chain runs child -> root; compose from the root down
    let matrix = chain
        .iter()
        .rev()
        .fold(Mat4::IDENTITY, |acc, local| acc * *local);

    write_global(world.inner_mut(), entity, matrix);
    trace!(entity = ?entity, depth = chain.len(), "Refreshed global transform");
    Ok(matrix)
}

fn write_global(inner: &mut hecs::World, entity: Entity, matrix: Mat4) {
    match inner.query_one_mut::<&mut GlobalTransform>(entity) {
        Ok(global) => {
            global.matrix = matrix;
        }
        Err(_) => {
            let _ = inner.insert_one(entity, GlobalTransform::from_matrix(matrix));
        }
    }
}
