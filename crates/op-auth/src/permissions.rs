//! Permission system for OpenProject RS
//!
//! A user holds a set of permission names per project; admins bypass every
//! check.

use std::collections::{HashMap, HashSet};

use op_contracts::UserContext;
use op_core::traits::Id;

/// Current user with permissions
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: Id,
    pub login: String,
    pub is_admin: bool,
    pub is_anonymous: bool,
    project_permissions: HashMap<Id, HashSet<String>>,
}

impl CurrentUser {
    pub fn new(id: Id, login: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
            is_admin: false,
            is_anonymous: false,
            project_permissions: HashMap::new(),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            is_anonymous: true,
            ..Self::new(0, "anonymous")
        }
    }

    pub fn admin(id: Id, login: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::new(id, login)
        }
    }

    pub fn add_project_permission(&mut self, project_id: Id, permission: impl Into<String>) {
        self.project_permissions
            .entry(project_id)
            .or_default()
            .insert(permission.into());
    }

    /// Builder-style variant of `add_project_permission` for several names
    pub fn with_project_permissions(mut self, project_id: Id, permissions: &[&str]) -> Self {
        for permission in permissions {
            self.add_project_permission(project_id, *permission);
        }
        self
    }

    /// Permissions held per project, sorted for stable token output
    pub fn project_permissions(&self) -> HashMap<Id, Vec<String>> {
        self.project_permissions
            .iter()
            .map(|(project_id, perms)| {
                let mut perms: Vec<String> = perms.iter().cloned().collect();
                perms.sort();
                (*project_id, perms)
            })
            .collect()
    }
}

impl UserContext for CurrentUser {
    fn id(&self) -> Id {
        self.id
    }

    fn is_admin(&self) -> bool {
        self.is_admin
    }

    fn is_anonymous(&self) -> bool {
        self.is_anonymous
    }

    fn allowed_in_project(&self, permission: &str, project_id: Id) -> bool {
        if self.is_admin {
            return true;
        }
        self.project_permissions
            .get(&project_id)
            .map_or(false, |perms| perms.contains(permission))
    }
}
