//! Building unsaved work packages from request parameters

use op_contracts::base::UserContext;
use op_contracts::work_packages::{permissions, permitted_attributes};
use op_core::error::OpError;
use op_core::result::OpResult;
use op_core::traits::Id;
use op_models::{Priority, Project, Status, Type, WorkPackage, WorkPackageAttributes, WorkPackageKind};
use serde_json::Value;
use tracing::debug;

use super::request::WorkPackageRequest;

fn id_param(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl<'a, U: UserContext> WorkPackageRequest<'a, U> {
    /// The work package a create request asks for.
    ///
    /// The discriminator is checked before anything is loaded. Permitted
    /// request attributes and the author are applied on top of a copied
    /// template, so request values win. Built once per request.
    pub async fn new_work_package(&mut self) -> OpResult<WorkPackage> {
        if let Some(wp) = &self.new_work_package {
            return Ok(wp.clone());
        }

        let kind: WorkPackageKind = self.params.requested_sti_type()?.unwrap_or("Issue").parse()?;

        let project = self.project().await?;
        let project_id = project.id.unwrap_or_default();
        let permitted = permitted_attributes(&self.params.submitted_attributes(), self.user, project_id);
        let (attributes, errors) = WorkPackageAttributes::parse(&permitted);
        let attributes = attributes.with_author(self.user.id());
        self.build_errors.merge(errors);

        let mut wp = match kind {
            WorkPackageKind::Issue => project.add_issue(&attributes),
            WorkPackageKind::PlanningElement => project.add_planning_element(&attributes),
        };

        if let Some(source_id) = self.params.copy_from {
            let source = self.copy_source(source_id).await?;
            wp.copy_from(&source);
            attributes.apply_to(&mut wp);
        }

        self.apply_defaults(&mut wp).await?;

        debug!(kind = %wp.kind, project_id, copy_from = ?self.params.copy_from, "built work package");
        self.new_work_package = Some(wp.clone());
        Ok(wp)
    }

    /// The work package shown by the `new` form
    pub async fn form_work_package(&mut self) -> OpResult<WorkPackage> {
        let project = self.project().await?;
        let project_id = project.id.unwrap_or_default();

        let mut copied_watchers = None;
        let mut wp = match self.params.id {
            None => {
                let mut wp = WorkPackage::new(WorkPackageKind::Issue, project_id);
                if let Some(source_id) = self.params.copy_from {
                    let source = self.copy_source(source_id).await?;
                    wp.copy_from(&source);
                    copied_watchers = Some(source.watcher_user_ids);
                }
                wp
            }
            Some(id) => self
                .find_visible(id)
                .await?
                .map(|(wp, _)| wp)
                .filter(|wp| wp.project_id == project_id)
                .ok_or_else(|| OpError::not_found("WorkPackage", "id", id))?,
        };
        wp.project_id = project_id;

        if wp.type_id.is_none() {
            let requested = id_param(self.params.issue.as_ref().and_then(|issue| issue.get("type_id")))
                .or_else(|| self.params.type_id.as_ref().map(|s| s.trim().to_string()))
                .filter(|s| !s.is_empty());
            wp.type_id = self.project_type(&project, requested.as_deref()).await?.id;
        }

        if wp.start_date.is_none() && self.handler.settings().startdate_is_adddate {
            wp.start_date = Some(self.today);
        }

        let may_add_watchers = self.user.allowed_to(permissions::ADD_WORK_PACKAGE_WATCHERS, project_id);
        if let Some(issue) = &self.params.issue {
            let permitted = permitted_attributes(issue, self.user, project_id);
            let (mut attributes, errors) = WorkPackageAttributes::parse(&permitted);
            if wp.id.is_some() {
                attributes.watcher_user_ids = None;
            }
            attributes.apply_to(&mut wp);
            self.build_errors.merge(errors);
        }

        if let Some(watchers) = copied_watchers.filter(|_| may_add_watchers) {
            wp.watcher_user_ids = watchers;
        }

        wp.author_id = Some(self.user.id());
        Ok(wp)
    }

    async fn copy_source(&self, source_id: Id) -> OpResult<WorkPackage> {
        self.find_visible(source_id)
            .await?
            .map(|(wp, _)| wp)
            .ok_or_else(|| OpError::not_found("WorkPackage", "id", source_id))
    }

    /// `requested` type of the project, or its first one
    async fn project_type(&self, project: &Project, requested: Option<&str>) -> OpResult<Type> {
        let types: Vec<Type> = self
            .store()
            .types()
            .await?
            .into_iter()
            .filter(|t| t.id.map_or(false, |id| project.type_ids.contains(&id)))
            .collect();

        let found = match requested {
            Some(raw) => raw
                .parse::<Id>()
                .ok()
                .and_then(|id| types.iter().find(|t| t.id == Some(id))),
            None => Type::first_by(&types, self.handler.settings().default_type_order),
        };

        found
            .cloned()
            .ok_or_else(|| OpError::not_found("Type", "id", requested.unwrap_or("first")))
    }

    async fn apply_defaults(&self, wp: &mut WorkPackage) -> OpResult<()> {
        if wp.status_id.is_none() {
            let statuses = self.store().statuses().await?;
            wp.status_id = Status::find_default(&statuses).and_then(|s| s.id);
        }
        if wp.priority_id.is_none() {
            let priorities = self.store().priorities().await?;
            wp.priority_id = Priority::find_default(&priorities).and_then(|p| p.id);
        }
        Ok(())
    }

    /// Statuses the `new` form offers for `wp`
    pub async fn allowed_statuses(&self, wp: &WorkPackage) -> OpResult<Vec<Status>> {
        let mut statuses = self.store().statuses().await?;
        statuses.sort_by_key(|s| (s.position, s.id));

        if self.user.allowed_to(permissions::CHANGE_WORK_PACKAGE_STATUS, wp.project_id) {
            return Ok(statuses);
        }
        Ok(statuses
            .into_iter()
            .filter(|s| s.is_default || (s.id.is_some() && s.id == wp.status_id))
            .collect())
    }
}
