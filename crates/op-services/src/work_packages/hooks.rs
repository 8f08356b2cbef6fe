//! Observers around the creation of a work package
//!
//! Hooks run synchronously in registration order. They must not block;
//! anything slow belongs in a spawned task.

use std::sync::Arc;

use op_models::WorkPackage;
use tracing::trace;

use super::params::WorkPackageParams;

/// Points in the create flow that observers can attach to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    NewBeforeSave,
    NewAfterSave,
}

pub trait WorkPackageHook: Send + Sync {
    fn name(&self) -> &str;

    /// Called with the built, unsaved work package; may adjust it
    fn new_before_save(&self, _work_package: &mut WorkPackage, _params: &WorkPackageParams) {}

    /// Called once the work package is persisted
    fn new_after_save(&self, _work_package: &WorkPackage, _params: &WorkPackageParams) {}
}

/// Ordered list of registered hooks
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn WorkPackageHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn WorkPackageHook>) {
        self.hooks.push(hook);
    }

    pub fn with(mut self, hook: Arc<dyn WorkPackageHook>) -> Self {
        self.register(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn new_before_save(&self, work_package: &mut WorkPackage, params: &WorkPackageParams) {
        for hook in &self.hooks {
            trace!(hook = hook.name(), event = ?HookEvent::NewBeforeSave, "calling hook");
            hook.new_before_save(work_package, params);
        }
    }

    pub fn new_after_save(&self, work_package: &WorkPackage, params: &WorkPackageParams) {
        for hook in &self.hooks {
            trace!(hook = hook.name(), event = ?HookEvent::NewAfterSave, "calling hook");
            hook.new_after_save(work_package, params);
        }
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.hooks.iter().map(|h| h.name())).finish()
    }
}
