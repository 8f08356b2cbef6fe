//! Work Package entity
//!
//! Table: work_packages

use chrono::{DateTime, NaiveDate, Utc};
use op_core::traits::{Entity, Id, Identifiable, ProjectScoped, SoftDeletable, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::kind::WorkPackageKind;

/// Work Package entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkPackage {
    pub id: Option<Id>,

    /// Discriminator; fixed once the record is persisted
    #[serde(rename = "stiType")]
    pub kind: WorkPackageKind,

    pub project_id: Id,
    pub type_id: Option<Id>,

    #[validate(length(max = 255))]
    pub subject: String,
    pub description: Option<String>,

    pub author_id: Option<Id>,
    pub status_id: Option<Id>,
    pub priority_id: Option<Id>,
    pub assigned_to_id: Option<Id>,
    pub responsible_id: Option<Id>,
    pub fixed_version_id: Option<Id>,
    pub category_id: Option<Id>,
    pub parent_id: Option<Id>,

    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,

    #[validate(range(min = 0.0))]
    pub estimated_hours: Option<f64>,

    #[validate(range(min = 0, max = 100))]
    #[serde(default)]
    pub done_ratio: i32,

    #[serde(default)]
    pub watcher_user_ids: Vec<Id>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    /// Soft-deletion mark (planning elements only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub lock_version: i32,
}

impl WorkPackage {
    /// Fresh, unsaved work package of the given kind inside a project
    pub fn new(kind: WorkPackageKind, project_id: Id) -> Self {
        Self {
            id: None,
            kind,
            project_id,
            type_id: None,
            subject: String::new(),
            description: None,
            author_id: None,
            status_id: None,
            priority_id: None,
            assigned_to_id: None,
            responsible_id: None,
            fixed_version_id: None,
            category_id: None,
            parent_id: None,
            start_date: None,
            due_date: None,
            estimated_hours: None,
            done_ratio: 0,
            watcher_user_ids: Vec::new(),
            created_at: None,
            updated_at: None,
            deleted_at: None,
            lock_version: 0,
        }
    }

    pub fn is_issue(&self) -> bool {
        self.kind == WorkPackageKind::Issue
    }

    pub fn is_planning_element(&self) -> bool {
        self.kind == WorkPackageKind::PlanningElement
    }

    /// Copy the content attributes of `source` onto `self`.
    ///
    /// Identity (id, kind, project), timestamps, the soft-deletion mark, the
    /// lock version and the watcher list are left untouched.
    pub fn copy_from(&mut self, source: &WorkPackage) {
        self.type_id = source.type_id;
        self.subject = source.subject.clone();
        self.description = source.description.clone();
        self.author_id = source.author_id;
        self.status_id = source.status_id;
        self.priority_id = source.priority_id;
        self.assigned_to_id = source.assigned_to_id;
        self.responsible_id = source.responsible_id;
        self.fixed_version_id = source.fixed_version_id;
        self.category_id = source.category_id;
        self.parent_id = source.parent_id;
        self.start_date = source.start_date;
        self.due_date = source.due_date;
        self.estimated_hours = source.estimated_hours;
        self.done_ratio = source.done_ratio;
    }

    /// Whether the record existed at instant `at`
    pub fn existed_at(&self, at: DateTime<Utc>) -> bool {
        let created = self.created_at.map_or(true, |created| created <= at);
        let alive = self.deleted_at.map_or(true, |deleted| deleted > at);
        created && alive
    }

    /// Ids of users that should hear about changes to this work package
    pub fn recipient_ids(&self) -> Vec<Id> {
        let mut ids: Vec<Id> = self
            .watcher_user_ids
            .iter()
            .copied()
            .chain(self.assigned_to_id)
            .chain(self.responsible_id)
            .filter(|id| Some(*id) != self.author_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

impl Identifiable for WorkPackage {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for WorkPackage {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl SoftDeletable for WorkPackage {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl ProjectScoped for WorkPackage {
    fn project_id(&self) -> Id {
        self.project_id
    }
}

impl Entity for WorkPackage {
    const TABLE_NAME: &'static str = "work_packages";
    const TYPE_NAME: &'static str = "WorkPackage";
}
