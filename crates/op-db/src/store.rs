//! The persistence seam of the work package request handler

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use op_core::traits::Id;
use op_journals::Journal;
use op_models::{Priority, Project, Relation, Status, Type, User, Version, WorkPackage};

use crate::repository::RepositoryResult;

/// Which planning elements of a project a listing contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanningElementScope {
    /// Everything not soft-deleted
    #[default]
    WithoutDeleted,
    /// Created at or before the instant and not deleted at it
    AtTime(DateTime<Utc>),
}

impl PlanningElementScope {
    pub fn includes(&self, wp: &WorkPackage) -> bool {
        if !wp.is_planning_element() {
            return false;
        }
        match self {
            Self::WithoutDeleted => wp.deleted_at.is_none(),
            Self::AtTime(at) => wp.existed_at(*at),
        }
    }
}

/// Storage of work packages and the reference data around them.
///
/// Lookups never apply visibility rules; the request handler filters.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait WorkPackageStore: Send + Sync {
    async fn find_work_package(&self, id: Id) -> RepositoryResult<Option<WorkPackage>>;

    async fn find_work_packages(&self, ids: Vec<Id>) -> RepositoryResult<Vec<WorkPackage>>;

    async fn find_project(&self, id: Id) -> RepositoryResult<Option<Project>>;

    async fn find_project_by_identifier(&self, identifier: String) -> RepositoryResult<Option<Project>>;

    async fn find_projects(&self, ids: Vec<Id>) -> RepositoryResult<Vec<Project>>;

    /// Insert a new record or update a persisted one.
    ///
    /// Returns the stored state (id, timestamps, lock version). Updates that
    /// change the discriminator or carry a stale lock version are conflicts.
    async fn save_work_package(&self, wp: WorkPackage, user_id: Id) -> RepositoryResult<WorkPackage>;

    /// Parent chain, root first
    async fn ancestors(&self, id: Id) -> RepositoryResult<Vec<WorkPackage>>;

    /// Whole subtree below `id`, ordered by id
    async fn descendants(&self, id: Id) -> RepositoryResult<Vec<WorkPackage>>;

    /// Relations starting or ending at `id`
    async fn relations_of(&self, id: Id) -> RepositoryResult<Vec<Relation>>;

    async fn journals_of(&self, id: Id) -> RepositoryResult<Vec<Journal>>;

    async fn priorities(&self) -> RepositoryResult<Vec<Priority>>;

    async fn statuses(&self) -> RepositoryResult<Vec<Status>>;

    async fn types(&self) -> RepositoryResult<Vec<Type>>;

    async fn find_users(&self, ids: Vec<Id>) -> RepositoryResult<Vec<User>>;

    async fn find_versions(&self, ids: Vec<Id>) -> RepositoryResult<Vec<Version>>;

    async fn planning_elements(
        &self,
        project_id: Id,
        scope: PlanningElementScope,
    ) -> RepositoryResult<Vec<WorkPackage>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use op_models::WorkPackageKind;

    fn element(created: i32, deleted: Option<i32>) -> WorkPackage {
        let mut wp = WorkPackage::new(WorkPackageKind::PlanningElement, 1);
        wp.created_at = Some(Utc.with_ymd_and_hms(created, 1, 1, 0, 0, 0).unwrap());
        wp.deleted_at = deleted.map(|year| Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap());
        wp
    }

    #[test]
    fn test_without_deleted() {
        let scope = PlanningElementScope::WithoutDeleted;
        assert!(scope.includes(&element(2012, None)));
        assert!(!scope.includes(&element(2012, Some(2013))));
        assert!(!scope.includes(&WorkPackage::new(WorkPackageKind::Issue, 1)));
    }

    #[test]
    fn test_at_time() {
        let scope = PlanningElementScope::AtTime(Utc.with_ymd_and_hms(2013, 6, 1, 0, 0, 0).unwrap());
        assert!(scope.includes(&element(2012, None)));
        assert!(scope.includes(&element(2012, Some(2014))));
        assert!(!scope.includes(&element(2012, Some(2013))));
        assert!(!scope.includes(&element(2014, None)));
    }
}
