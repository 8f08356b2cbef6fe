//! Version model
//!
//! Table: versions

use chrono::{DateTime, NaiveDate, Utc};
use op_core::traits::{Entity, Id, Identifiable, ProjectScoped, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    #[default]
    Open,
    Locked,
    Closed,
}

/// Release or milestone that work packages can target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: Option<Id>,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    pub project_id: Id,

    pub effective_date: Option<NaiveDate>,

    #[serde(default)]
    pub status: VersionStatus,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identifiable for Version {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for Version {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl ProjectScoped for Version {
    fn project_id(&self) -> Id {
        self.project_id
    }
}

impl Entity for Version {
    const TABLE_NAME: &'static str = "versions";
    const TYPE_NAME: &'static str = "Version";
}

impl Version {
    pub fn new(name: impl Into<String>, project_id: Id) -> Self {
        Self {
            id: None,
            name: name.into(),
            project_id,
            effective_date: None,
            status: VersionStatus::Open,
            created_at: None,
            updated_at: None,
        }
    }

    /// Only open versions accept new work packages
    pub fn is_assignable(&self) -> bool {
        self.status == VersionStatus::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_open_versions_are_assignable() {
        let mut version = Version::new("1.0", 1);
        assert!(version.is_assignable());
        version.status = VersionStatus::Locked;
        assert!(!version.is_assignable());
    }
}
