//! In-memory work package store
//!
//! Backs the request handler in tests and when the server runs without a
//! database. Seeding methods accept fully formed records (ids included).

use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use op_core::traits::Id;
use op_journals::Journal;
use op_models::{Priority, Project, Relation, Status, Type, User, Version, WorkPackage};
use tokio::sync::RwLock;
use tracing::debug;

use crate::repository::{RepositoryError, RepositoryResult};
use crate::store::{PlanningElementScope, WorkPackageStore};

#[derive(Default)]
struct Tables {
    work_packages: BTreeMap<Id, WorkPackage>,
    projects: BTreeMap<Id, Project>,
    relations: Vec<Relation>,
    journals: Vec<Journal>,
    priorities: Vec<Priority>,
    statuses: Vec<Status>,
    types: Vec<Type>,
    users: BTreeMap<Id, User>,
    versions: BTreeMap<Id, Version>,
}

impl Tables {
    fn next_work_package_id(&self) -> Id {
        self.work_packages.keys().next_back().map_or(1, |id| id + 1)
    }
}

#[derive(Default)]
pub struct MemoryWorkPackageStore {
    tables: RwLock<Tables>,
}

fn require_id(id: Option<Id>, what: &str) -> RepositoryResult<Id> {
    id.ok_or_else(|| RepositoryError::Corrupt(format!("{what} seeded without id")))
}

impl MemoryWorkPackageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_project(&self, project: Project) -> RepositoryResult<()> {
        let id = require_id(project.id, "project")?;
        self.tables.write().await.projects.insert(id, project);
        Ok(())
    }

    /// Store a work package as-is, bypassing save semantics
    pub async fn insert_work_package(&self, wp: WorkPackage) -> RepositoryResult<()> {
        let id = require_id(wp.id, "work package")?;
        self.tables.write().await.work_packages.insert(id, wp);
        Ok(())
    }

    pub async fn insert_relation(&self, relation: Relation) {
        self.tables.write().await.relations.push(relation);
    }

    pub async fn insert_journal(&self, journal: Journal) {
        self.tables.write().await.journals.push(journal);
    }

    pub async fn insert_priority(&self, priority: Priority) {
        self.tables.write().await.priorities.push(priority);
    }

    pub async fn insert_status(&self, status: Status) {
        self.tables.write().await.statuses.push(status);
    }

    pub async fn insert_type(&self, type_def: Type) {
        self.tables.write().await.types.push(type_def);
    }

    pub async fn insert_user(&self, user: User) -> RepositoryResult<()> {
        let id = require_id(user.id, "user")?;
        self.tables.write().await.users.insert(id, user);
        Ok(())
    }

    pub async fn insert_version(&self, version: Version) -> RepositoryResult<()> {
        let id = require_id(version.id, "version")?;
        self.tables.write().await.versions.insert(id, version);
        Ok(())
    }

    pub async fn work_package_count(&self) -> usize {
        self.tables.read().await.work_packages.len()
    }
}

#[async_trait]
impl WorkPackageStore for MemoryWorkPackageStore {
    async fn find_work_package(&self, id: Id) -> RepositoryResult<Option<WorkPackage>> {
        Ok(self.tables.read().await.work_packages.get(&id).cloned())
    }

    async fn find_work_packages(&self, ids: Vec<Id>) -> RepositoryResult<Vec<WorkPackage>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.work_packages.get(id).cloned())
            .collect())
    }

    async fn find_project(&self, id: Id) -> RepositoryResult<Option<Project>> {
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }

    async fn find_project_by_identifier(&self, identifier: String) -> RepositoryResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .values()
            .find(|p| p.identifier == identifier)
            .cloned())
    }

    async fn find_projects(&self, ids: Vec<Id>) -> RepositoryResult<Vec<Project>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.projects.get(id).cloned()).collect())
    }

    async fn save_work_package(&self, mut wp: WorkPackage, user_id: Id) -> RepositoryResult<WorkPackage> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        match wp.id {
            None => {
                let id = tables.next_work_package_id();
                wp.id = Some(id);
                wp.created_at = Some(now);
                wp.updated_at = Some(now);
                wp.lock_version = 0;

                let mut journal = Journal::for_creation(&wp, id, user_id);
                journal.id = Some(tables.journals.len() as Id + 1);
                tables.journals.push(journal);
                tables.work_packages.insert(id, wp.clone());
                debug!(id, kind = %wp.kind, "Work package inserted");
            }
            Some(id) => {
                let stored = tables
                    .work_packages
                    .get(&id)
                    .ok_or_else(|| RepositoryError::NotFound(format!("work package {id}")))?;
                if stored.kind != wp.kind {
                    return Err(RepositoryError::Conflict(format!(
                        "work package {id} cannot change from {} to {}",
                        stored.kind, wp.kind
                    )));
                }
                if stored.lock_version != wp.lock_version {
                    return Err(RepositoryError::Conflict(
                        "Work package was modified by another user".to_string(),
                    ));
                }
                wp.created_at = stored.created_at;
                wp.updated_at = Some(now);
                wp.lock_version += 1;
                tables.work_packages.insert(id, wp.clone());
                debug!(id, "Work package updated");
            }
        }

        Ok(wp)
    }

    async fn ancestors(&self, id: Id) -> RepositoryResult<Vec<WorkPackage>> {
        let tables = self.tables.read().await;
        let mut chain = Vec::new();
        let mut current = tables.work_packages.get(&id).and_then(|wp| wp.parent_id);

        while let Some(parent_id) = current {
            // Guard against cycles in corrupt data
            if chain.iter().any(|wp: &WorkPackage| wp.id == Some(parent_id)) {
                break;
            }
            let Some(parent) = tables.work_packages.get(&parent_id) else {
                break;
            };
            chain.push(parent.clone());
            current = parent.parent_id;
        }

        chain.reverse();
        Ok(chain)
    }

    async fn descendants(&self, id: Id) -> RepositoryResult<Vec<WorkPackage>> {
        let tables = self.tables.read().await;
        let mut found: Vec<WorkPackage> = Vec::new();
        let mut queue = VecDeque::from([id]);

        while let Some(parent_id) = queue.pop_front() {
            for child in tables.work_packages.values() {
                if child.parent_id == Some(parent_id) && !found.iter().any(|wp| wp.id == child.id) {
                    if let Some(child_id) = child.id {
                        queue.push_back(child_id);
                    }
                    found.push(child.clone());
                }
            }
        }

        found.sort_by_key(|wp| wp.id);
        Ok(found)
    }

    async fn relations_of(&self, id: Id) -> RepositoryResult<Vec<Relation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .relations
            .iter()
            .filter(|r| r.involves(id))
            .cloned()
            .collect())
    }

    async fn journals_of(&self, id: Id) -> RepositoryResult<Vec<Journal>> {
        let tables = self.tables.read().await;
        Ok(tables
            .journals
            .iter()
            .filter(|j| j.journable_id == id)
            .cloned()
            .collect())
    }

    async fn priorities(&self) -> RepositoryResult<Vec<Priority>> {
        Ok(self.tables.read().await.priorities.clone())
    }

    async fn statuses(&self) -> RepositoryResult<Vec<Status>> {
        Ok(self.tables.read().await.statuses.clone())
    }

    async fn types(&self) -> RepositoryResult<Vec<Type>> {
        Ok(self.tables.read().await.types.clone())
    }

    async fn find_users(&self, ids: Vec<Id>) -> RepositoryResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.users.get(id).cloned()).collect())
    }

    async fn find_versions(&self, ids: Vec<Id>) -> RepositoryResult<Vec<Version>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.versions.get(id).cloned()).collect())
    }

    async fn planning_elements(
        &self,
        project_id: Id,
        scope: PlanningElementScope,
    ) -> RepositoryResult<Vec<WorkPackage>> {
        let tables = self.tables.read().await;
        Ok(tables
            .work_packages
            .values()
            .filter(|wp| wp.project_id == project_id && scope.includes(wp))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_models::WorkPackageKind;

    fn wp(id: Id, parent_id: Option<Id>) -> WorkPackage {
        let mut wp = WorkPackage::new(WorkPackageKind::Issue, 1);
        wp.id = Some(id);
        wp.parent_id = parent_id;
        wp
    }

    async fn tree() -> MemoryWorkPackageStore {
        let store = MemoryWorkPackageStore::new();
        for (id, parent) in [(1, None), (2, Some(1)), (3, Some(2)), (4, Some(2)), (5, Some(4)), (6, None)] {
            store.insert_work_package(wp(id, parent)).await.unwrap();
        }
        store
    }

    fn ids(wps: &[WorkPackage]) -> Vec<Id> {
        wps.iter().filter_map(|wp| wp.id).collect()
    }

    #[tokio::test]
    async fn test_ancestors_root_first() {
        let store = tree().await;
        assert_eq!(ids(&store.ancestors(5).await.unwrap()), vec![1, 2, 4]);
        assert!(store.ancestors(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_descendants() {
        let store = tree().await;
        assert_eq!(ids(&store.descendants(2).await.unwrap()), vec![3, 4, 5]);
        assert!(store.descendants(6).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_journal() {
        let store = tree().await;
        let mut new = WorkPackage::new(WorkPackageKind::Issue, 1);
        new.subject = "New".into();

        let saved = store.save_work_package(new, 9).await.unwrap();
        assert_eq!(saved.id, Some(7));
        assert!(saved.created_at.is_some());

        let journals = store.journals_of(7).await.unwrap();
        assert_eq!(journals.len(), 1);
        assert_eq!(journals[0].user_id, 9);
        assert!(journals[0].is_initial());
    }

    #[tokio::test]
    async fn test_update_cannot_change_kind() {
        let store = tree().await;
        let mut changed = store.find_work_package(3).await.unwrap().unwrap();
        changed.kind = WorkPackageKind::PlanningElement;

        let result = store.save_work_package(changed, 1).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_checks_lock_version() {
        let store = tree().await;
        let current = store.find_work_package(3).await.unwrap().unwrap();

        let updated = store.save_work_package(current.clone(), 1).await.unwrap();
        assert_eq!(updated.lock_version, 1);

        let stale = store.save_work_package(current, 1).await;
        assert!(matches!(stale, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_seeding_requires_ids() {
        let store = MemoryWorkPackageStore::new();
        let result = store.insert_project(Project::new("x", "X")).await;
        assert!(matches!(result, Err(RepositoryError::Corrupt(_))));
    }
}
