use std::rc::Rc;

use kernel::settings::DEFAULT_GRAVITY_Y;
use kernel::{KernelConfig, Vec3};

use crate::error::PhysicsResult;
use crate::world::World;

/// Explicitly scoped kernel context.
///
/// Create one before building any world. Every [`World`] keeps the context alive, so the kernel
/// is shut down only after the last world (and everything holding one) is gone.
#[derive(Clone)]
pub struct Physics(Rc<Context>);

struct Context {
    config: KernelConfig,
}

impl Drop for Context {
    fn drop(&mut self) {
        log::debug!("physics kernel shut down");
    }
}

impl Physics {
    /// Initialize the kernel with default tuning.
    pub fn init() -> Self {
        Self::with_config(KernelConfig::default())
    }

    pub fn with_config(config: KernelConfig) -> Self {
        let config = config.sanitized();
        log::debug!(
            "physics kernel initialized ({} solver iterations, hash levels {}..={})",
            config.solver_iterations,
            config.hash_min_level,
            config.hash_max_level
        );
        Self(Rc::new(Context { config }))
    }

    pub fn config(&self) -> KernelConfig {
        self.0.config
    }

    /// Create a world. Fails when the tag list is too long or repeats a name.
    pub fn new_world(&self, desc: WorldDesc) -> PhysicsResult<World> {
        World::new(self.clone(), desc)
    }
}

impl std::fmt::Debug for Physics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Physics")
            .field("config", &self.0.config)
            .finish()
    }
}

/// Construction parameters of a [`World`].
#[derive(Clone, Debug, PartialEq)]
pub struct WorldDesc {
    pub gravity: Vec3,
    /// Whether colliders may fall asleep by default.
    pub allow_sleep: bool,
    /// Collision tag names, at most [`kernel::settings::MAX_TAGS`].
    pub tags: Vec<String>,
}

impl Default for WorldDesc {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, DEFAULT_GRAVITY_Y, 0.0),
            allow_sleep: true,
            tags: Vec::new(),
        }
    }
}

impl WorldDesc {
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_sleep(mut self, allow_sleep: bool) -> Self {
        self.allow_sleep = allow_sleep;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}
