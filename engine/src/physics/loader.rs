//! Lazy, process-wide physics engine loading
//!
//! The engine module is imported at most once per successful load. Callers
//! that arrive while a load is running share its outcome; a failed load is
//! reported to every waiter and the next caller starts over.

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use crate::config::PhysicsSettings;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};

/// Errors raised while bringing up the physics engine. Cloned to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineLoadError {
    #[error("failed to import physics module: {0}")]
    Import(String),

    #[error("physics module initialization failed: {0}")]
    Init(String),
}

/// Whether the imported module needs its explicit init step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineInit {
    /// Decide from the target platform
    #[default]
    Auto,
    Required,
    Skipped,
}

impl EngineInit {
    pub fn is_required(self) -> bool {
        match self {
            EngineInit::Auto => Platform::current().requires_engine_init(),
            EngineInit::Required => true,
            EngineInit::Skipped => false,
        }
    }
}

/// Runtime platform the engine is loaded on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Native,
    Web,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_arch = "wasm32") {
            Platform::Web
        } else {
            Platform::Native
        }
    }

    /// Web builds must run the module's init before first use
    pub fn requires_engine_init(self) -> bool {
        matches!(self, Platform::Web)
    }
}

/// Where an engine module comes from
pub trait ModuleSource: Send + Sync + 'static {
    type Module: Send + Sync + 'static;

    /// Bring the module into memory
    fn import(&self) -> BoxFuture<'static, Result<Self::Module, EngineLoadError>>;

    /// One-time setup, run after import when the platform requires it
    fn initialize(&self, module: Arc<Self::Module>) -> BoxFuture<'static, Result<(), EngineLoadError>>;
}

type SharedLoad<M> = Shared<BoxFuture<'static, Result<Arc<M>, EngineLoadError>>>;

enum LoaderState<M> {
    Unloaded,
    Loading { attempt: u64, load: SharedLoad<M> },
    Ready(Arc<M>),
    Failed(EngineLoadError),
}

/// Observable loader state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderStatus {
    Unloaded,
    Loading,
    Ready,
    Failed(EngineLoadError),
}

/// Loads an engine module once and hands the same instance to every caller
pub struct EngineLoader<S: ModuleSource> {
    source: Arc<S>,
    init: EngineInit,
    state: Mutex<LoaderState<S::Module>>,
    attempts: AtomicU64,
}

impl<S: ModuleSource> EngineLoader<S> {
    pub fn new(source: S, init: EngineInit) -> Self {
        Self {
            source: Arc::new(source),
            init,
            state: Mutex::new(LoaderState::Unloaded),
            attempts: AtomicU64::new(0),
        }
    }

    /// Loader whose init step follows the scene's physics settings
    pub fn from_settings(source: S, settings: &PhysicsSettings) -> Self {
        Self::new(source, settings.engine_init)
    }

    pub fn init(&self) -> EngineInit {
        self.init
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn status(&self) -> LoaderStatus {
        match &*self.lock_state() {
            LoaderState::Unloaded => LoaderStatus::Unloaded,
            LoaderState::Loading { .. } => LoaderStatus::Loading,
            LoaderState::Ready(_) => LoaderStatus::Ready,
            LoaderState::Failed(err) => LoaderStatus::Failed(err.clone()),
        }
    }

    /// The loaded module, if a load has already succeeded
    pub fn get(&self) -> Option<Arc<S::Module>> {
        match &*self.lock_state() {
            LoaderState::Ready(module) => Some(module.clone()),
            _ => None,
        }
    }

    /// Return the module, importing it first if needed
    pub async fn load(&self) -> Result<Arc<S::Module>, EngineLoadError> {
        let (attempt, pending) = {
            let mut state = self.lock_state();
            match &*state {
                LoaderState::Ready(module) => return Ok(module.clone()),
                LoaderState::Loading { attempt, load } => (*attempt, load.clone()),
                LoaderState::Unloaded | LoaderState::Failed(_) => {
                    let attempt = self.next_attempt();
                    let load = self.start_load(attempt);
                    *state = LoaderState::Loading {
                        attempt,
                        load: load.clone(),
                    };
                    (attempt, load)
                }
            }
        };

        let result = pending.await;

        let mut state = self.lock_state();
        // Only the attempt we waited on may settle the state
        if matches!(&*state, LoaderState::Loading { attempt: current, .. } if *current == attempt) {
            *state = match &result {
                Ok(module) => LoaderState::Ready(module.clone()),
                Err(err) => LoaderState::Failed(err.clone()),
            };
        }

        result
    }

    /// Block the current thread until the module is loaded
    pub fn load_blocking(&self) -> Result<Arc<S::Module>, EngineLoadError> {
        pollster::block_on(self.load())
    }

    fn start_load(&self, attempt: u64) -> SharedLoad<S::Module> {
        let source = self.source.clone();
        let run_init = self.init.is_required();
        info!(attempt, run_init, "Loading physics engine module");

        async move {
            let module = Arc::new(source.import().await.map_err(|err| {
                error!("Physics module import failed: {}", err);
                err
            })?);

            if run_init {
                debug!("Initializing physics module");
                source.initialize(module.clone()).await.map_err(|err| {
                    error!("Physics module initialization failed: {}", err);
                    err
                })?;
            }

            info!(attempt, "Physics engine ready");
            Ok::<_, EngineLoadError>(module)
        }
        .boxed()
        .shared()
    }

    fn next_attempt(&self) -> u64 {
        self.attempts.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn lock_state(&self) -> MutexGuard<'_, LoaderState<S::Module>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
