//! Authorization helpers shared by the request actions
//!
//! Authorization is a precondition of every action: it runs after the
//! project is resolved and before anything is built or saved.

use op_contracts::base::UserContext;
use op_contracts::work_packages::permissions;
use op_core::error::OpError;
use op_core::result::OpResult;
use op_models::{modules, Project};
use tracing::debug;

/// Fail with `Forbidden` unless `user` holds `permission` in `project`
pub fn authorize<U: UserContext + ?Sized>(user: &U, permission: &str, project: &Project) -> OpResult<()> {
    let project_id = project.id.unwrap_or_default();
    if project.active && user.allowed_to(permission, project_id) {
        return Ok(());
    }

    debug!(user_id = user.id(), project_id, permission, "authorization denied");
    Err(OpError::forbidden(format!(
        "You are not authorized to {} in this project",
        permission.replace('_', " ")
    )))
}

/// Whether work packages of `project` are visible to `user`.
///
/// The project must be active, have work package tracking enabled and grant
/// `view_work_packages` (admins pass the permission check).
pub fn visible_in<U: UserContext + ?Sized>(user: &U, project: &Project) -> bool {
    project.active
        && project.module_enabled(modules::WORK_PACKAGE_TRACKING)
        && user.allowed_to(permissions::VIEW_WORK_PACKAGES, project.id.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work_packages::test_support::{project, TestUser};

    #[test]
    fn test_authorize() {
        let user = TestUser::member(2, 1, &["add_work_packages"]);
        assert!(authorize(&user, "add_work_packages", &project(1)).is_ok());

        let err = authorize(&user, "view_work_packages", &project(1)).unwrap_err();
        assert!(matches!(err, OpError::Forbidden { .. }));
    }

    #[test]
    fn test_archived_project_denies_everyone() {
        let mut archived = project(1);
        archived.active = false;
        assert!(authorize(&TestUser::admin(1), "add_work_packages", &archived).is_err());
        assert!(!visible_in(&TestUser::admin(1), &archived));
    }

    #[test]
    fn test_visibility_needs_module() {
        let user = TestUser::member(2, 1, &["view_work_packages"]);
        let mut p = project(1);
        assert!(visible_in(&user, &p));

        p.enabled_modules.clear();
        assert!(!visible_in(&user, &p));
        assert!(!visible_in(&TestUser::member(3, 1, &[]), &project(1)));
    }
}
