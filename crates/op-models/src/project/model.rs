//! Project model
//!
//! Table: projects

use chrono::{DateTime, Utc};
use op_core::traits::{Entity, Id, Identifiable, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::work_package::{WorkPackage, WorkPackageAttributes, WorkPackageKind};

/// Project entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Option<Id>,

    /// Unique identifier (URL-safe slug)
    #[validate(length(min = 1, max = 100))]
    pub identifier: String,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    pub description: Option<String>,

    #[serde(default)]
    pub public: bool,

    /// Archived projects are inactive
    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default)]
    pub enabled_modules: Vec<String>,

    /// Types available in this project
    #[serde(default)]
    pub type_ids: Vec<Id>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Default for Project {
    fn default() -> Self {
        Self {
            id: None,
            identifier: String::new(),
            name: String::new(),
            description: None,
            public: false,
            active: true,
            enabled_modules: Vec::new(),
            type_ids: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl Identifiable for Project {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for Project {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for Project {
    const TABLE_NAME: &'static str = "projects";
    const TYPE_NAME: &'static str = "Project";
}

impl Project {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn archived(&self) -> bool {
        !self.active
    }

    pub fn module_enabled(&self, module: &str) -> bool {
        self.enabled_modules.iter().any(|m| m == module)
    }

    /// Unsaved work package of `kind` scoped to this project
    pub fn add_work_package(&self, kind: WorkPackageKind, attributes: &WorkPackageAttributes) -> WorkPackage {
        let mut wp = WorkPackage::new(kind, self.id.unwrap_or_default());
        attributes.apply_to(&mut wp);
        wp
    }

    pub fn add_issue(&self, attributes: &WorkPackageAttributes) -> WorkPackage {
        self.add_work_package(WorkPackageKind::Issue, attributes)
    }

    pub fn add_planning_element(&self, attributes: &WorkPackageAttributes) -> WorkPackage {
        self.add_work_package(WorkPackageKind::PlanningElement, attributes)
    }
}
