//! Closure-backed systems.

use engine_ecs::Space;

use crate::system::System;

/// A [`System`] whose `update` is a closure. `render` does nothing.
pub struct FnSystem<F> {
    name: &'static str,
    update: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut Space, f64) + 'static,
{
    #[must_use]
    pub fn new(name: &'static str, update: F) -> Self {
        Self { name, update }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut Space, f64) + 'static,
{
    fn update(&mut self, space: &mut Space, interval: f64) {
        (self.update)(space, interval);
    }
}

impl<F> std::fmt::Debug for FnSystem<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSystem").field("name", &self.name).finish()
    }
}

/// Shorthand for [`FnSystem::new`].
pub fn system_fn<F>(name: &'static str, update: F) -> FnSystem<F>
where
    F: FnMut(&mut Space, f64) + 'static,
{
    FnSystem::new(name, update)
}
