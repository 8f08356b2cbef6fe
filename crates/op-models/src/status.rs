//! Status model
//!
//! Table: statuses

use chrono::{DateTime, Utc};
use op_core::traits::{Entity, Id, Identifiable, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Work package status (New, In progress, Closed, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub id: Option<Id>,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Whether this status means "closed/done"
    #[serde(default)]
    pub is_closed: bool,

    /// Assigned to new work packages when none is given
    #[serde(default)]
    pub is_default: bool,

    #[serde(default)]
    pub position: i32,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            is_closed: false,
            is_default: false,
            position: 0,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Identifiable for Status {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for Status {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for Status {
    const TABLE_NAME: &'static str = "statuses";
    const TYPE_NAME: &'static str = "Status";
}

impl Status {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The status flagged as default, if any
    pub fn find_default(statuses: &[Status]) -> Option<&Status> {
        statuses.iter().find(|s| s.is_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_default() {
        let mut new = Status::new("New");
        new.is_default = true;
        let closed = Status {
            is_closed: true,
            ..Status::new("Closed")
        };

        let statuses = vec![closed, new];
        assert_eq!(Status::find_default(&statuses).map(|s| s.name.as_str()), Some("New"));
        assert!(Status::find_default(&statuses[..1]).is_none());
    }
}
