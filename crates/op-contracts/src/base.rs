//! Base contract system

use op_core::error::ValidationErrors;
use op_core::traits::Id;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

/// The acting user, as seen by contracts and the request handler
pub trait UserContext: Send + Sync {
    fn id(&self) -> Id;
    fn is_admin(&self) -> bool;
    fn is_anonymous(&self) -> bool;
    fn allowed_in_project(&self, permission: &str, project_id: Id) -> bool;

    /// Admins are allowed everything
    fn allowed_to(&self, permission: &str, project_id: Id) -> bool {
        self.is_admin() || self.allowed_in_project(permission, project_id)
    }
}

/// Base contract trait
pub trait Contract<T>: Send + Sync {
    fn validate(&self, entity: &T) -> ValidationResult;
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashSet;

    use super::*;

    pub struct MockUser {
        pub id: Id,
        pub admin: bool,
        pub permissions: HashSet<(String, Id)>,
    }

    impl MockUser {
        pub fn member(id: Id, project_id: Id, permissions: &[&str]) -> Self {
            Self {
                id,
                admin: false,
                permissions: permissions
                    .iter()
                    .map(|p| (p.to_string(), project_id))
                    .collect(),
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

    impl UserContext for MockUser {
        fn id(&self) -> Id { self.id }
        fn is_admin(&self) -> bool { self.admin }
        fn is_anonymous(&self) -> bool { false }
        fn allowed_in_project(&self, permission: &str, project_id: Id) -> bool {
            self.permissions.contains(&(permission.to_string(), project_id))
        }
    }
}
