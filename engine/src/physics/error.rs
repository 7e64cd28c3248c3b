//! Physics error types

use super::groups::GroupError;
use super::loader::EngineLoadError;
use crate::core::entity::{Entity, HierarchyError};

/// Errors raised while building or binding physics bodies
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error(transparent)]
    Group(#[from] GroupError),

    #[error("physics engine unavailable: {0}")]
    EngineUnavailable(#[from] EngineLoadError),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error("a physics world already exists for this scene")]
    WorldAlreadyExists,

    #[error("scene physics has been torn down")]
    TornDown,

    #[error("entity {0:?} has no physics body")]
    MissingBody(Entity),

    #[error("no collider could be derived for entity {0:?}")]
    NoCollider(Entity),

    #[error("invalid collider geometry: {0}")]
    InvalidGeometry(String),
}
