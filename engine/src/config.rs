//! Configuration types for the engine

use crate::physics::loader::EngineInit;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Errors raised while reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid asset name: {0}")]
    InvalidName(String),

    #[error("Timestep must be positive and finite, got {0}")]
    InvalidTimestep(f32),
}

/// Configuration for asset paths
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Root directory for all assets
    pub asset_root: PathBuf,
    /// Directory name for scenes (relative to asset_root)
    pub scenes_dir: String,
}

impl AssetConfig {
    /// Create a new AssetConfig with custom paths
    pub fn new(asset_root: PathBuf, scenes_dir: String) -> Self {
        debug!(asset_root = ?asset_root, scenes_dir = scenes_dir, "Creating new AssetConfig");
        Self {
            asset_root,
            scenes_dir,
        }
    }

    /// Get the full path to a scene file
    pub fn scene_path(&self, name: &str) -> Result<PathBuf, ConfigError> {
        // Names must stay inside the scenes directory
        if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(ConfigError::InvalidName(name.to_string()));
        }
        Ok(self
            .asset_root
            .join(&self.scenes_dir)
            .join(format!("{name}.json")))
    }

    /// Path of the optional physics settings file
    pub fn physics_settings_path(&self) -> PathBuf {
        self.asset_root.join("physics.json")
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            scenes_dir: "scenes".to_string(),
        }
    }
}

/// Settings applied to every physics world a scene creates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhysicsSettings {
    pub gravity: Vec3,
    /// Fixed simulation step in seconds
    pub timestep: f32,
    /// Override for the engine's explicit init step
    pub engine_init: EngineInit,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            timestep: 1.0 / 60.0,
            engine_init: EngineInit::Auto,
        }
    }
}

impl PhysicsSettings {
    /// Parse settings from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        info!(path = ?path, "Loaded physics settings");
        Ok(settings)
    }

    /// Load the asset tree's settings file, falling back to defaults when absent
    pub fn load_or_default(assets: &AssetConfig) -> Result<Self, ConfigError> {
        let path = assets.physics_settings_path();
        if !path.exists() {
            debug!(path = ?path, "No physics settings file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(ConfigError::InvalidTimestep(self.timestep));
        }
        Ok(())
    }
}
