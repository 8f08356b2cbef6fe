//! Priority model (issue priority)
//!
//! Table: enumerations (with type = 'IssuePriority')

use chrono::{DateTime, Utc};
use op_core::traits::{Entity, Id, Identifiable, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Work package priority entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Priority {
    pub id: Option<Id>,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub position: i32,

    #[serde(default)]
    pub is_default: bool,

    /// Inactive priorities cannot be selected any more
    #[serde(default = "default_true")]
    pub active: bool,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Default for Priority {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            position: 0,
            is_default: false,
            active: true,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Identifiable for Priority {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for Priority {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for Priority {
    const TABLE_NAME: &'static str = "enumerations";
    const TYPE_NAME: &'static str = "Priority";
}

impl Priority {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Active priorities ordered by position
    pub fn active_by_position(priorities: impl IntoIterator<Item = Priority>) -> Vec<Priority> {
        let mut active: Vec<Priority> = priorities.into_iter().filter(|p| p.active).collect();
        active.sort_by_key(|p| (p.position, p.id));
        active
    }

    /// The active priority flagged as default, if any
    pub fn find_default(priorities: &[Priority]) -> Option<&Priority> {
        priorities.iter().find(|p| p.is_default && p.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_by_position() {
        let priorities = vec![
            Priority {
                id: Some(1),
                position: 2,
                ..Priority::new("High")
            },
            Priority {
                id: Some(2),
                position: 1,
                ..Priority::new("Low")
            },
            Priority {
                id: Some(3),
                position: 0,
                active: false,
                ..Priority::new("Obsolete")
            },
        ];

        let names: Vec<_> = Priority::active_by_position(priorities)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Low", "High"]);
    }

    #[test]
    fn test_find_default_skips_inactive() {
        let priorities = vec![
            Priority {
                id: Some(1),
                is_default: true,
                active: false,
                ..Priority::new("Old default")
            },
            Priority {
                id: Some(2),
                is_default: true,
                ..Priority::new("Normal")
            },
        ];
        assert_eq!(Priority::find_default(&priorities).and_then(|p| p.id), Some(2));
    }
}
