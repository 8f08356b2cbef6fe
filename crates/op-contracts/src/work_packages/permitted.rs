//! Permission-filtered attribute maps

use op_core::traits::Id;
use serde_json::{Map, Value};

use super::permissions;
use crate::base::UserContext;

/// Attributes any user allowed to add work packages may set
pub const ALWAYS_PERMITTED: &[&str] = &[
    "subject",
    "description",
    "start_date",
    "due_date",
    "type_id",
    "parent_id",
    "assigned_to_id",
    "responsible_id",
    "priority_id",
    "category_id",
    "estimated_hours",
    "done_ratio",
];

/// Attributes that need an extra permission
pub const GATED: &[(&str, &str)] = &[
    ("status_id", permissions::CHANGE_WORK_PACKAGE_STATUS),
    ("fixed_version_id", permissions::ASSIGN_VERSIONS),
    ("watcher_user_ids", permissions::ADD_WORK_PACKAGE_WATCHERS),
];

/// Keep only the attributes `user` may write inside `project_id`.
///
/// Everything else is dropped silently. The input is not modified.
pub fn permitted_attributes<U: UserContext + ?Sized>(
    raw: &Map<String, Value>,
    user: &U,
    project_id: Id,
) -> Map<String, Value> {
    raw.iter()
        .filter(|(key, _)| is_permitted(key, user, project_id))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn is_permitted<U: UserContext + ?Sized>(key: &str, user: &U, project_id: Id) -> bool {
    if ALWAYS_PERMITTED.contains(&key) {
        return true;
    }
    GATED
        .iter()
        .find(|(attribute, _)| *attribute == key)
        .map_or(false, |(_, permission)| user.allowed_to(permission, project_id))
}
