//! Associations of the resolved work package, as the `show` view needs them

use std::collections::{BTreeSet, HashMap};

use op_contracts::base::UserContext;
use op_core::result::OpResult;
use op_core::traits::Id;
use op_db::WorkPackageStore;
use op_journals::{changing_history, Journal};
use op_models::{Priority, Project, Relation, RelationKind, Status, Type, User, Version, WorkPackage, WorkPackageKind};
use serde::Serialize;

use super::outcome::Changeset;
use super::request::WorkPackageRequest;
use crate::base::visible_in;

/// A work package together with the records its listing row shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedWorkPackage {
    pub work_package: WorkPackage,
    pub project: Option<Project>,
    #[serde(rename = "type")]
    pub type_def: Option<Type>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<User>,
    pub fixed_version: Option<Version>,
}

impl LoadedWorkPackage {
    /// No associations loaded
    pub fn bare(work_package: WorkPackage) -> Self {
        Self {
            work_package,
            project: None,
            type_def: None,
            status: None,
            priority: None,
            assigned_to: None,
            fixed_version: None,
        }
    }

    pub fn id(&self) -> Option<Id> {
        self.work_package.id
    }
}

/// A relation seen from the resolved work package
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedRelation {
    pub relation: Relation,
    /// Relation kind read from this side
    pub kind: RelationKind,
    pub other: LoadedWorkPackage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedJournal {
    pub journal: Journal,
    pub user: Option<User>,
}

fn unique(ids: impl IntoIterator<Item = Id>) -> Vec<Id> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

fn index<T>(records: Vec<T>, id: impl Fn(&T) -> Option<Id>) -> HashMap<Id, T> {
    records
        .into_iter()
        .filter_map(|record| id(&record).map(|key| (key, record)))
        .collect()
}

/// Batch-loaded associations of a set of work packages
struct Preload {
    projects: HashMap<Id, Project>,
    types: HashMap<Id, Type>,
    statuses: HashMap<Id, Status>,
    priorities: HashMap<Id, Priority>,
    users: HashMap<Id, User>,
    versions: HashMap<Id, Version>,
}

impl Preload {
    /// One query per association; `people` adds assignees and versions
    async fn load(store: &dyn WorkPackageStore, work_packages: &[WorkPackage], people: bool) -> OpResult<Self> {
        let projects = store
            .find_projects(unique(work_packages.iter().map(|wp| wp.project_id)))
            .await?;
        let (users, versions) = if people {
            let users = store
                .find_users(unique(work_packages.iter().filter_map(|wp| wp.assigned_to_id)))
                .await?;
            let versions = store
                .find_versions(unique(work_packages.iter().filter_map(|wp| wp.fixed_version_id)))
                .await?;
            (users, versions)
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(Self {
            projects: index(projects, |p| p.id),
            types: index(store.types().await?, |t| t.id),
            statuses: index(store.statuses().await?, |s| s.id),
            priorities: index(store.priorities().await?, |p| p.id),
            users: index(users, |u| u.id),
            versions: index(versions, |v| v.id),
        })
    }

    fn visible<U: UserContext + ?Sized>(&self, user: &U, wp: &WorkPackage) -> bool {
        self.projects
            .get(&wp.project_id)
            .map_or(false, |project| visible_in(user, project))
    }

    fn attach(&self, wp: WorkPackage) -> LoadedWorkPackage {
        fn lookup<T: Clone>(map: &HashMap<Id, T>, id: Option<Id>) -> Option<T> {
            id.and_then(|id| map.get(&id).cloned())
        }

        LoadedWorkPackage {
            project: self.projects.get(&wp.project_id).cloned(),
            type_def: lookup(&self.types, wp.type_id),
            status: lookup(&self.statuses, wp.status_id),
            priority: lookup(&self.priorities, wp.priority_id),
            assigned_to: lookup(&self.users, wp.assigned_to_id),
            fixed_version: lookup(&self.versions, wp.fixed_version_id),
            work_package: wp,
        }
    }
}

impl<'a, U: UserContext> WorkPackageRequest<'a, U> {
    /// Parent chain of the work package, root first
    pub async fn ancestors(&mut self) -> OpResult<Vec<LoadedWorkPackage>> {
        if let Some(ancestors) = &self.ancestors {
            return Ok(ancestors.clone());
        }

        let ancestors = match self.work_package().await? {
            Some(WorkPackage { id: Some(id), kind, .. }) => {
                let tree = self.store().ancestors(id).await?;
                self.restrict_tree(kind, tree).await?
            }
            _ => Vec::new(),
        };

        self.ancestors = Some(ancestors.clone());
        Ok(ancestors)
    }

    /// Subtree below the work package, ordered by id
    pub async fn descendants(&mut self) -> OpResult<Vec<LoadedWorkPackage>> {
        if let Some(descendants) = &self.descendants {
            return Ok(descendants.clone());
        }

        let descendants = match self.work_package().await? {
            Some(WorkPackage { id: Some(id), kind, .. }) => {
                let tree = self.store().descendants(id).await?;
                self.restrict_tree(kind, tree).await?
            }
            _ => Vec::new(),
        };

        self.descendants = Some(descendants.clone());
        Ok(descendants)
    }

    async fn restrict_tree(&self, kind: WorkPackageKind, tree: Vec<WorkPackage>) -> OpResult<Vec<LoadedWorkPackage>> {
        match kind {
            // A planning element tree lives in one project, so access to
            // the resolved element covers the whole tree.
            WorkPackageKind::PlanningElement => Ok(tree.into_iter().map(LoadedWorkPackage::bare).collect()),
            WorkPackageKind::Issue => {
                let preload = Preload::load(self.store(), &tree, true).await?;
                Ok(tree
                    .into_iter()
                    .filter(|wp| preload.visible(self.user, wp))
                    .map(|wp| preload.attach(wp))
                    .collect())
            }
        }
    }

    /// Relations whose other end exists and is visible
    pub async fn relations(&mut self) -> OpResult<Vec<LoadedRelation>> {
        if let Some(relations) = &self.relations {
            return Ok(relations.clone());
        }

        let relations = match self.work_package().await?.and_then(|wp| wp.id) {
            Some(id) => self.load_relations(id).await?,
            None => Vec::new(),
        };

        self.relations = Some(relations.clone());
        Ok(relations)
    }

    async fn load_relations(&self, id: Id) -> OpResult<Vec<LoadedRelation>> {
        let relations = self.store().relations_of(id).await?;
        if relations.is_empty() {
            return Ok(Vec::new());
        }

        let others = self
            .store()
            .find_work_packages(unique(relations.iter().map(|r| r.other_end(id))))
            .await?;
        let preload = Preload::load(self.store(), &others, false).await?;
        let others = index(others, |wp| wp.id);

        Ok(relations
            .into_iter()
            .filter_map(|relation| {
                let other = others.get(&relation.other_end(id))?;
                if !preload.visible(self.user, other) {
                    return None;
                }
                Some(LoadedRelation {
                    kind: relation.kind_for(id),
                    other: preload.attach(other.clone()),
                    relation,
                })
            })
            .collect())
    }

    /// Changing journals with their authors, oldest first
    pub async fn journals(&mut self) -> OpResult<Vec<LoadedJournal>> {
        if let Some(journals) = &self.journals {
            return Ok(journals.clone());
        }

        let journals = match self.work_package().await?.and_then(|wp| wp.id) {
            Some(id) => {
                let history = changing_history(self.store().journals_of(id).await?);
                let users = self
                    .store()
                    .find_users(unique(history.iter().map(|j| j.user_id)))
                    .await?;
                let users = index(users, |u| u.id);
                history
                    .into_iter()
                    .map(|journal| LoadedJournal {
                        user: users.get(&journal.user_id).cloned(),
                        journal,
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        self.journals = Some(journals.clone());
        Ok(journals)
    }

    /// Active priorities ordered by position
    pub async fn priorities(&mut self) -> OpResult<Vec<Priority>> {
        if let Some(priorities) = &self.priorities {
            return Ok(priorities.clone());
        }

        let priorities = Priority::active_by_position(self.store().priorities().await?);
        self.priorities = Some(priorities.clone());
        Ok(priorities)
    }

    /// Repository changesets are not tracked
    pub fn changesets(&self) -> Vec<Changeset> {
        Vec::new()
    }
}
