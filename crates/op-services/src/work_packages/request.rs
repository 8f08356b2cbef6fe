//! Request-scoped state of a work package action
//!
//! Everything the action resolves or loads is memoized here on first use and
//! dropped with the request.

use chrono::NaiveDate;
use op_contracts::base::UserContext;
use op_core::error::{OpError, ValidationErrors};
use op_core::result::OpResult;
use op_core::traits::Id;
use op_db::{PlanningElementScope, WorkPackageStore};
use op_models::{Priority, Project, WorkPackage};
use tokio::task::JoinHandle;
use tracing::debug;

use super::associations::{LoadedJournal, LoadedRelation, LoadedWorkPackage};
use super::handler::WorkPackageHandler;
use super::params::WorkPackageParams;
use crate::base::visible_in;

pub struct WorkPackageRequest<'a, U: UserContext> {
    pub(super) handler: &'a WorkPackageHandler,
    pub(super) user: &'a U,
    pub(super) params: WorkPackageParams,
    pub(super) today: NaiveDate,

    pub(super) project: Option<Project>,
    pub(super) resolved: Option<Option<(WorkPackage, Project)>>,
    pub(super) new_work_package: Option<WorkPackage>,
    pub(super) build_errors: ValidationErrors,

    pub(super) ancestors: Option<Vec<LoadedWorkPackage>>,
    pub(super) descendants: Option<Vec<LoadedWorkPackage>>,
    pub(super) relations: Option<Vec<LoadedRelation>>,
    pub(super) journals: Option<Vec<LoadedJournal>>,
    pub(super) priorities: Option<Vec<Priority>>,

    pub(super) planning_element_scope: PlanningElementScope,
    pub(super) errors: ValidationErrors,
    pub(super) notification: Option<JoinHandle<()>>,
}

impl<'a, U: UserContext> WorkPackageRequest<'a, U> {
    pub(super) fn new(handler: &'a WorkPackageHandler, user: &'a U, params: WorkPackageParams, today: NaiveDate) -> Self {
        Self {
            handler,
            user,
            params,
            today,
            project: None,
            resolved: None,
            new_work_package: None,
            build_errors: ValidationErrors::new(),
            ancestors: None,
            descendants: None,
            relations: None,
            journals: None,
            priorities: None,
            planning_element_scope: PlanningElementScope::default(),
            errors: ValidationErrors::new(),
            notification: None,
        }
    }

    /// Pin "today" (defaults to the current UTC date)
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn params(&self) -> &WorkPackageParams {
        &self.params
    }

    pub fn user(&self) -> &U {
        self.user
    }

    /// Field errors collected from request parameters
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub(super) fn store(&self) -> &'a dyn WorkPackageStore {
        self.handler.store()
    }

    /// The work package named by `id`, if it exists and is visible
    pub async fn work_package(&mut self) -> OpResult<Option<WorkPackage>> {
        Ok(self.resolve().await?.map(|(wp, _)| wp))
    }

    async fn resolve(&mut self) -> OpResult<Option<(WorkPackage, Project)>> {
        if let Some(resolved) = &self.resolved {
            return Ok(resolved.clone());
        }

        let resolved = match self.params.id {
            Some(id) => self.find_visible(id).await?,
            None => None,
        };
        self.resolved = Some(resolved.clone());
        Ok(resolved)
    }

    /// `id` with its project, or `None` when absent or invisible
    pub(super) async fn find_visible(&self, id: Id) -> OpResult<Option<(WorkPackage, Project)>> {
        let Some(wp) = self.store().find_work_package(id).await? else {
            debug!(id, "work package not found");
            return Ok(None);
        };
        let project = self.store().find_project(wp.project_id).await?;

        match project {
            Some(project) if visible_in(self.user, &project) => Ok(Some((wp, project))),
            _ => {
                debug!(id, user_id = self.user.id(), "work package not visible");
                Ok(None)
            }
        }
    }

    /// The project of the request.
    ///
    /// An explicit `project_id` (id or identifier) wins; otherwise the
    /// project of the resolved work package.
    pub async fn project(&mut self) -> OpResult<Project> {
        if let Some(project) = &self.project {
            return Ok(project.clone());
        }

        let project = match self.params.project_id.clone() {
            Some(key) => self
                .find_project(&key)
                .await?
                .ok_or_else(|| OpError::not_found("Project", "id", key))?,
            None => self
                .resolve()
                .await?
                .map(|(_, project)| project)
                .ok_or_else(|| OpError::not_found("WorkPackage", "id", self.params.id.unwrap_or_default()))?,
        };

        self.project = Some(project.clone());
        Ok(project)
    }

    async fn find_project(&self, key: &str) -> OpResult<Option<Project>> {
        let project = match key.trim().parse::<Id>() {
            Ok(id) => self.store().find_project(id).await?,
            Err(_) => self.store().find_project_by_identifier(key.trim().to_string()).await?,
        };
        Ok(project)
    }
}
