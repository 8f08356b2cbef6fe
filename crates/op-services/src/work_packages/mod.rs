//! Work package request handling
//!
//! A [`WorkPackageHandler`] holds the long-lived collaborators (store,
//! attachments, notifications, hooks, settings). Each HTTP request gets a
//! [`WorkPackageRequest`] that memoizes what the action resolves:
//!
//! ```ignore
//! let mut request = handler.request(&current_user, params);
//! let outcome = request.create().await?;
//! ```

mod actions;
mod associations;
mod builder;
mod create;
mod handler;
mod hooks;
mod listing;
mod outcome;
mod params;
mod request;

pub use associations::{LoadedJournal, LoadedRelation, LoadedWorkPackage};
pub use create::NOTICE_SUCCESSFUL_CREATE;
pub use handler::WorkPackageHandler;
pub use hooks::{HookEvent, HookRegistry, WorkPackageHook};
pub use listing::{parse_timestamp, MalformedTimestamp, UNKNOWN_FORMAT};
pub use outcome::{work_package_path, AttributesView, Changeset, Flash, NewView, Outcome, ShowView, View};
pub use params::WorkPackageParams;
pub use request::WorkPackageRequest;

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashSet;
    use std::sync::Arc;

    use op_contracts::base::UserContext;
    use op_core::traits::Id;
    use op_db::{MemoryWorkPackageStore, WorkPackageStore};
    use op_models::{modules, Priority, Project, Status, Type, User, Version, WorkPackage, WorkPackageKind};

    use super::WorkPackageHandler;

    pub struct TestUser {
        pub id: Id,
        pub admin: bool,
        pub permissions: HashSet<(String, Id)>,
    }

    impl TestUser {
        pub fn member(id: Id, project_id: Id, permissions: &[&str]) -> Self {
            Self {
                id,
                admin: false,
                permissions: permissions.iter().map(|p| (p.to_string(), project_id)).collect(),
            }
        }

        pub fn admin(id: Id) -> Self {
            Self {
                id,
                admin: true,
                permissions: HashSet::new(),
            }
        }
    }

    impl UserContext for TestUser {
        fn id(&self) -> Id {
            self.id
        }

        fn is_admin(&self) -> bool {
            self.admin
        }

        fn is_anonymous(&self) -> bool {
            false
        }

        fn allowed_in_project(&self, permission: &str, project_id: Id) -> bool {
            self.permissions.contains(&(permission.to_string(), project_id))
        }
    }

    pub fn project(id: Id) -> Project {
        Project {
            id: Some(id),
            enabled_modules: vec![
                modules::WORK_PACKAGE_TRACKING.to_string(),
                modules::TIMELINES.to_string(),
            ],
            type_ids: vec![1, 2],
            ..Project::new("ecookbook", "eCookbook")
        }
    }

    pub fn work_package(id: Id, project_id: Id) -> WorkPackage {
        let mut wp = WorkPackage::new(WorkPackageKind::Issue, project_id);
        wp.id = Some(id);
        wp.subject = format!("Work package #{id}");
        wp
    }

    pub fn handler_with(store: Arc<dyn WorkPackageStore>) -> WorkPackageHandler {
        WorkPackageHandler::new(
            store,
            op_attachments::AttachmentService::in_memory(Default::default()),
            op_notifications::NotificationService::in_memory(),
            Default::default(),
        )
    }

    /// Project 1 ("ecookbook") with types, statuses, priorities and two users
    pub async fn seeded_store() -> Arc<MemoryWorkPackageStore> {
        let store = MemoryWorkPackageStore::new();
        store.insert_project(project(1)).await.unwrap();

        for (id, name, position) in [(1, "Bug", 2), (2, "Feature", 1), (3, "Support", 0)] {
            store
                .insert_type(Type {
                    id: Some(id),
                    position,
                    ..Type::new(name)
                })
                .await;
        }
        for (id, name, position) in [(1, "New", 1), (2, "In Progress", 2), (3, "Closed", 3)] {
            store
                .insert_status(Status {
                    id: Some(id),
                    position,
                    is_default: id == 1,
                    is_closed: id == 3,
                    ..Status::new(name)
                })
                .await;
        }
        for (id, name, position, active) in [
            (1, "Low", 1, true),
            (2, "Normal", 2, true),
            (3, "High", 3, true),
            (4, "Obsolete", 0, false),
        ] {
            store
                .insert_priority(Priority {
                    id: Some(id),
                    position,
                    active,
                    is_default: id == 2,
                    ..Priority::new(name)
                })
                .await;
        }
        for (id, login, admin) in [(1, "admin", true), (2, "jsmith", false)] {
            store
                .insert_user(User {
                    id: Some(id),
                    admin,
                    ..User::new(login)
                })
                .await
                .unwrap();
        }
        store
            .insert_version(Version {
                id: Some(1),
                ..Version::new("1.0", 1)
            })
            .await
            .unwrap();

        Arc::new(store)
    }
}
