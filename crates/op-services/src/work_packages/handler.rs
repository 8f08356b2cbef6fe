//! Long-lived collaborators shared by all work package requests

use std::sync::Arc;

use chrono::Utc;
use op_attachments::{AttachmentConfig, AttachmentService};
use op_contracts::base::UserContext;
use op_core::config::WorkPackageSettings;
use op_db::{MemoryWorkPackageStore, WorkPackageStore};
use op_notifications::NotificationService;

use super::hooks::HookRegistry;
use super::params::WorkPackageParams;
use super::request::WorkPackageRequest;

/// Entry point of the work package actions.
///
/// Cheap to clone; every request gets its own [`WorkPackageRequest`] via
/// [`WorkPackageHandler::request`].
#[derive(Clone)]
pub struct WorkPackageHandler {
    store: Arc<dyn WorkPackageStore>,
    attachments: AttachmentService,
    notifications: NotificationService,
    hooks: HookRegistry,
    settings: WorkPackageSettings,
}

impl WorkPackageHandler {
    pub fn new(
        store: Arc<dyn WorkPackageStore>,
        attachments: AttachmentService,
        notifications: NotificationService,
        settings: WorkPackageSettings,
    ) -> Self {
        Self {
            store,
            attachments,
            notifications,
            hooks: HookRegistry::new(),
            settings,
        }
    }

    /// Handler over `store` with in-memory attachments and notifications
    pub fn in_memory(store: Arc<MemoryWorkPackageStore>) -> Self {
        Self::new(
            store,
            AttachmentService::in_memory(AttachmentConfig::default()),
            NotificationService::in_memory(),
            WorkPackageSettings::default(),
        )
    }

    pub fn with_settings(mut self, settings: WorkPackageSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    /// Per-request state for `user` acting with `params`
    pub fn request<'a, U: UserContext>(&'a self, user: &'a U, params: WorkPackageParams) -> WorkPackageRequest<'a, U> {
        WorkPackageRequest::new(self, user, params, Utc::now().date_naive())
    }

    pub fn store(&self) -> &dyn WorkPackageStore {
        self.store.as_ref()
    }

    pub fn attachments(&self) -> &AttachmentService {
        &self.attachments
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn settings(&self) -> &WorkPackageSettings {
        &self.settings
    }
}
