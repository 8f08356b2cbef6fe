//! The four work package actions
//!
//! | action   | permission           |
//! |----------|----------------------|
//! | show     | `view_work_packages` |
//! | new      | `add_work_packages`  |
//! | new_type | `add_work_packages`  |
//! | create   | `add_work_packages`  |
//!
//! Each resolves the project first, then authorizes, and only then builds,
//! loads or saves anything.

use op_contracts::base::UserContext;
use op_contracts::work_packages::permissions;
use op_core::error::OpError;
use op_core::result::OpResult;
use tracing::instrument;

use super::outcome::{AttributesView, Flash, NewView, Outcome, ShowView, View};
use super::request::WorkPackageRequest;
use crate::base::authorize;

impl<'a, U: UserContext> WorkPackageRequest<'a, U> {
    #[instrument(skip(self), fields(id = ?self.params.id))]
    pub async fn show(&mut self) -> OpResult<Outcome> {
        let work_package = self
            .work_package()
            .await?
            .ok_or_else(|| OpError::not_found("WorkPackage", "id", self.params.id.unwrap_or_default()))?;
        let project = self.project().await?;
        authorize(self.user, permissions::VIEW_WORK_PACKAGES, &project)?;

        if let Some(at) = self.params.at.clone() {
            self.apply_at_timestamp(&at);
        }
        if !self.errors.is_empty() {
            return Ok(Outcome::Errors(self.errors.clone()));
        }

        let view = View::Show(Box::new(ShowView {
            ancestors: self.ancestors().await?,
            descendants: self.descendants().await?,
            relations: self.relations().await?,
            journals: self.journals().await?,
            changesets: self.changesets(),
            priorities: self.priorities().await?,
            planning_elements: self.planning_elements().await?,
            work_package,
            project,
        }));

        if self.params.is_js() {
            Ok(Outcome::Partial { partial: "show", view })
        } else {
            Ok(Outcome::render("work_packages/show", view))
        }
    }

    /// The `new` form
    #[instrument(skip(self), fields(project_id = ?self.params.project_id))]
    pub async fn new_form(&mut self) -> OpResult<Outcome> {
        let project = self.project().await?;
        authorize(self.user, permissions::ADD_WORK_PACKAGES, &project)?;

        let work_package = self.form_work_package().await?;
        let priorities = self.priorities().await?;
        let allowed_statuses = self.allowed_statuses(&work_package).await?;

        Ok(Outcome::Render {
            template: "work_packages/new",
            view: View::New(Box::new(NewView {
                work_package,
                project,
                priorities,
                allowed_statuses,
            })),
            errors: std::mem::take(&mut self.build_errors),
            flash: Flash::default(),
        })
    }

    /// Attribute fields of the form after the type or variant changed
    #[instrument(skip(self), fields(project_id = ?self.params.project_id))]
    pub async fn new_type(&mut self) -> OpResult<Outcome> {
        let project = self.project().await?;
        authorize(self.user, permissions::ADD_WORK_PACKAGES, &project)?;

        let work_package = self.new_work_package().await?;
        let priorities = self.priorities().await?;

        Ok(Outcome::Partial {
            partial: "attributes",
            view: View::Attributes(Box::new(AttributesView {
                work_package,
                project,
                priorities,
            })),
        })
    }

    #[instrument(skip(self), fields(project_id = ?self.params.project_id))]
    pub async fn create(&mut self) -> OpResult<Outcome> {
        let project = self.project().await?;
        authorize(self.user, permissions::ADD_WORK_PACKAGES, &project)?;
        self.save_new_work_package().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use op_attachments::{AttachmentConfig, AttachmentService, UploadedFile};
    use op_db::{MemoryWorkPackageStore, MockWorkPackageStore, WorkPackageStore};
    use op_models::{Project, WorkPackage, WorkPackageKind};
    use op_notifications::NotificationService;
    use serde_json::{json, Map, Value};

    use super::super::hooks::recording::{CallLog, RecordingHook};
    use super::super::hooks::{HookEvent, HookRegistry};
    use super::super::params::WorkPackageParams;
    use super::super::test_support::{project, seeded_store, TestUser};
    use super::*;
    use crate::work_packages::{WorkPackageHandler, NOTICE_SUCCESSFUL_CREATE, UNKNOWN_FORMAT};

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn contributor() -> TestUser {
        TestUser::member(2, 1, &["view_work_packages", "add_work_packages"])
    }

    async fn store_with_type_three() -> Arc<MemoryWorkPackageStore> {
        let store = seeded_store().await;
        store
            .insert_project(Project {
                type_ids: vec![1, 2, 3],
                ..project(1)
            })
            .await
            .unwrap();
        store
    }

    fn create_params(attributes: Value) -> WorkPackageParams {
        WorkPackageParams::new()
            .with_project_id(1)
            .with_work_package(map(attributes))
    }

    #[tokio::test]
    async fn test_create_persists_and_redirects() {
        let store = store_with_type_three().await;
        let handler = WorkPackageHandler::in_memory(store.clone());
        let user = contributor();
        let mut request = handler.request(&user, create_params(json!({"type_id": 3, "subject": "Fix bug"})));

        let outcome = request.create().await.unwrap();
        let Outcome::Redirect { location, flash } = outcome else {
            panic!("expected redirect, got {outcome:?}");
        };
        assert_eq!(location, "/work_packages/1");
        assert_eq!(flash.notice.as_deref(), Some(NOTICE_SUCCESSFUL_CREATE));
        assert_eq!(flash.warning, None);

        let saved = store.find_work_package(1).await.unwrap().unwrap();
        assert_eq!(saved.type_id, Some(3));
        assert_eq!(saved.subject, "Fix bug");
        assert_eq!(saved.author_id, Some(2));
        assert_eq!(store.journals_of(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_drops_status_without_permission() {
        let store = seeded_store().await;
        let handler = WorkPackageHandler::in_memory(store.clone());
        let user = contributor();
        let params = create_params(json!({"type_id": 1, "subject": "Status", "status_id": 3, "priority_id": 3}));

        let outcome = handler.request(&user, params.clone()).create().await.unwrap();
        assert!(outcome.is_redirect());
        let saved = store.find_work_package(1).await.unwrap().unwrap();
        assert_eq!(saved.status_id, Some(1));
        assert_eq!(saved.priority_id, Some(3));

        let manager = TestUser::member(
            2,
            1,
            &["view_work_packages", "add_work_packages", "change_work_package_status"],
        );
        handler.request(&manager, params).create().await.unwrap();
        let saved = store.find_work_package(2).await.unwrap().unwrap();
        assert_eq!(saved.status_id, Some(3));
    }

    #[tokio::test]
    async fn test_failed_create_renders_new_with_errors() {
        let store = seeded_store().await;
        let handler = WorkPackageHandler::in_memory(store.clone());
        let user = contributor();
        let params = create_params(json!({"type_id": 1, "subject": "  ", "due_date": "never"}));

        let outcome = handler.request(&user, params).create().await.unwrap();
        let Outcome::Render { template, view, errors, .. } = outcome else {
            panic!("expected render, got {outcome:?}");
        };
        assert_eq!(template, "work_packages/new");
        assert!(errors.has_error("subject"));
        assert!(errors.has_error("due_date"));
        let View::New(view) = view else {
            panic!("expected new view");
        };
        assert_eq!(view.work_package.id, None);
        assert_eq!(view.work_package.type_id, Some(1));
        assert_eq!(view.priorities.len(), 3);
        assert_eq!(store.work_package_count().await, 0);
    }

    #[tokio::test]
    async fn test_planning_element_needs_dates() {
        let store = seeded_store().await;
        let handler = WorkPackageHandler::in_memory(store.clone());
        let user = contributor();
        let params = create_params(json!({"type_id": 1, "subject": "Phase"})).with_sti_type("PlanningElement");

        let outcome = handler.request(&user, params.clone()).create().await.unwrap();
        assert!(matches!(outcome, Outcome::Render { ref errors, .. } if errors.has_error("start_date")));

        let params = create_params(json!({
            "type_id": 1,
            "subject": "Phase",
            "start_date": "2013-05-01",
            "due_date": "2013-05-31",
        }))
        .with_sti_type("PlanningElement");
        assert!(handler.request(&user, params).create().await.unwrap().is_redirect());
        assert!(store.find_work_package(1).await.unwrap().unwrap().is_planning_element());
    }

    #[tokio::test]
    async fn test_create_without_permission_never_saves() {
        let mut store = MockWorkPackageStore::new();
        store.expect_find_project().returning(|id| Ok(Some(project(id))));
        store.expect_save_work_package().times(0);

        let handler = super::super::test_support::handler_with(Arc::new(store));
        let viewer = TestUser::member(3, 1, &["view_work_packages"]);
        let params = create_params(json!({"type_id": 1, "subject": "Nope"}));

        let err = handler.request(&viewer, params).create().await.unwrap_err();
        assert!(matches!(err, OpError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_create_notifies_unless_suppressed() {
        let store = seeded_store().await;
        let notifications = NotificationService::in_memory();
        let handler = WorkPackageHandler::new(
            store,
            AttachmentService::in_memory(AttachmentConfig::default()),
            notifications.clone(),
            Default::default(),
        );
        let admin = TestUser::admin(1);
        let attributes = json!({"type_id": 1, "subject": "Assigned", "assigned_to_id": 2});

        let mut request = handler.request(&admin, create_params(attributes.clone()).with_send_notification("0"));
        request.create().await.unwrap();
        assert!(request.take_notification_task().is_none());

        let mut request = handler.request(&admin, create_params(attributes).with_send_notification("1"));
        request.create().await.unwrap();
        request.take_notification_task().unwrap().await.unwrap();

        let delivered = notifications.for_user(2, false).await.unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].resource_id, 2);
        assert!(notifications.for_user(1, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_attaches_files_and_warns() {
        let store = seeded_store().await;
        let attachments = AttachmentService::in_memory(AttachmentConfig::default().with_max_file_size(16));
        let handler = WorkPackageHandler::new(
            store,
            attachments.clone(),
            NotificationService::in_memory(),
            Default::default(),
        );
        let user = contributor();
        let params = create_params(json!({"type_id": 1, "subject": "Files"}))
            .with_attachment(UploadedFile::new("notes.txt", &b"small"[..]).with_content_type("text/plain"))
            .with_attachment(UploadedFile::new("dump.bin", vec![0u8; 64]));

        let outcome = handler.request(&user, params).create().await.unwrap();
        let Outcome::Redirect { flash, .. } = outcome else {
            panic!("expected redirect, got {outcome:?}");
        };
        assert_eq!(flash.warning.as_deref(), Some("1 file(s) could not be saved."));

        let stored = attachments.for_container(1).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].filename, "notes.txt");
        assert_eq!(stored[0].author_id, 2);
    }

    #[tokio::test]
    async fn test_create_runs_hooks_around_save() {
        let log = Arc::new(CallLog::default());
        let hooks = HookRegistry::new()
            .with(RecordingHook::new("audit", &log))
            .with(RecordingHook::new("sync", &log));
        let handler = WorkPackageHandler::in_memory(seeded_store().await).with_hooks(hooks);
        let user = contributor();

        handler
            .request(&user, create_params(json!({"type_id": 1, "subject": "Hooked"})))
            .create()
            .await
            .unwrap();

        let calls: Vec<_> = log.calls().into_iter().map(|(name, event, _)| (name, event)).collect();
        assert_eq!(
            calls,
            vec![
                ("audit".to_string(), HookEvent::NewBeforeSave),
                ("sync".to_string(), HookEvent::NewBeforeSave),
                ("audit".to_string(), HookEvent::NewAfterSave),
                ("sync".to_string(), HookEvent::NewAfterSave),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_create_skips_after_save_hooks() {
        let log = Arc::new(CallLog::default());
        let handler = WorkPackageHandler::in_memory(seeded_store().await)
            .with_hooks(HookRegistry::new().with(RecordingHook::new("audit", &log)));
        let user = contributor();

        handler
            .request(&user, create_params(json!({"type_id": 1, "subject": ""})))
            .create()
            .await
            .unwrap();

        let events: Vec<_> = log.calls().into_iter().map(|(_, event, _)| event).collect();
        assert_eq!(events, vec![HookEvent::NewBeforeSave]);
    }

    async fn show_store() -> Arc<MemoryWorkPackageStore> {
        let store = seeded_store().await;
        let mut wp = WorkPackage::new(WorkPackageKind::Issue, 1);
        wp.id = Some(7);
        wp.subject = "Shown".into();
        store.insert_work_package(wp).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_show_renders_all_locals() {
        let handler = WorkPackageHandler::in_memory(show_store().await);
        let user = TestUser::member(2, 1, &["view_work_packages"]);

        let outcome = handler.request(&user, WorkPackageParams::new().with_id(7)).show().await.unwrap();
        let Outcome::Render { template, view: View::Show(view), errors, .. } = outcome else {
            panic!("expected show view, got {outcome:?}");
        };
        assert_eq!(template, "work_packages/show");
        assert!(errors.is_empty());
        assert_eq!(view.work_package.subject, "Shown");
        assert_eq!(view.project.id, Some(1));
        assert!(view.changesets.is_empty());
        assert_eq!(view.priorities.len(), 3);

        let js = WorkPackageParams::new().with_id(7).with_format("js");
        let outcome = handler.request(&user, js).show().await.unwrap();
        assert!(matches!(outcome, Outcome::Partial { partial: "show", .. }));
    }

    #[tokio::test]
    async fn test_show_with_malformed_at_renders_errors() {
        let handler = WorkPackageHandler::in_memory(show_store().await);
        let user = TestUser::member(2, 1, &["view_work_packages"]);
        let params = WorkPackageParams::new().with_id(7).with_at("yesterday");

        let outcome = handler.request(&user, params).show().await.unwrap();
        let Outcome::Errors(errors) = outcome else {
            panic!("expected errors, got {outcome:?}");
        };
        assert_eq!(errors.get("at"), Some(&vec![UNKNOWN_FORMAT.to_string()]));
    }

    #[tokio::test]
    async fn test_show_missing_or_invisible_is_not_found() {
        let handler = WorkPackageHandler::in_memory(show_store().await);
        let stranger = TestUser::member(3, 2, &["view_work_packages"]);

        for id in [7, 404] {
            let err = handler
                .request(&stranger, WorkPackageParams::new().with_id(id))
                .show()
                .await
                .unwrap_err();
            assert!(matches!(err, OpError::NotFound { .. }));
        }
    }

    #[tokio::test]
    async fn test_new_form_and_new_type() {
        let handler = WorkPackageHandler::in_memory(seeded_store().await);
        let user = contributor();

        let outcome = handler
            .request(&user, WorkPackageParams::new().with_project_id("ecookbook"))
            .new_form()
            .await
            .unwrap();
        let Outcome::Render { template, view: View::New(view), .. } = outcome else {
            panic!("expected new view, got {outcome:?}");
        };
        assert_eq!(template, "work_packages/new");
        assert_eq!(view.work_package.project_id, 1);
        assert_eq!(view.allowed_statuses.len(), 1);

        let params = WorkPackageParams::new()
            .with_project_id(1)
            .with_sti_type("PlanningElement");
        let outcome = handler.request(&user, params).new_type().await.unwrap();
        let Outcome::Partial { partial, view: View::Attributes(view) } = outcome else {
            panic!("expected attributes partial, got {outcome:?}");
        };
        assert_eq!(partial, "attributes");
        assert!(view.work_package.is_planning_element());
    }

    #[tokio::test]
    async fn test_new_requires_add_permission() {
        let handler = WorkPackageHandler::in_memory(seeded_store().await);
        let viewer = TestUser::member(3, 1, &["view_work_packages"]);

        let err = handler
            .request(&viewer, WorkPackageParams::new().with_project_id(1))
            .new_form()
            .await
            .unwrap_err();
        assert!(matches!(err, OpError::Forbidden { .. }));
    }
}
