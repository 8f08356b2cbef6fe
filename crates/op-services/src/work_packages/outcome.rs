//! What an action asks the presentation layer to do

use op_core::error::ValidationErrors;
use op_core::traits::Id;
use op_models::{Priority, Project, Status, WorkPackage};
use serde::Serialize;

use super::associations::{LoadedJournal, LoadedRelation, LoadedWorkPackage};

/// Flash messages shown with the next page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Flash {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Flash {
    pub fn is_empty(&self) -> bool {
        self.notice.is_none() && self.warning.is_none()
    }
}

/// Repository changeset linked to a work package
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Changeset {
    pub id: Id,
    pub revision: String,
    pub comments: Option<String>,
}

/// Locals of `work_packages/show`
#[derive(Debug, Clone, Serialize)]
pub struct ShowView {
    pub work_package: WorkPackage,
    pub project: Project,
    pub ancestors: Vec<LoadedWorkPackage>,
    pub descendants: Vec<LoadedWorkPackage>,
    pub relations: Vec<LoadedRelation>,
    pub journals: Vec<LoadedJournal>,
    pub changesets: Vec<Changeset>,
    pub priorities: Vec<Priority>,
    pub planning_elements: Vec<WorkPackage>,
}

/// Locals of `work_packages/new`
#[derive(Debug, Clone, Serialize)]
pub struct NewView {
    pub work_package: WorkPackage,
    pub project: Project,
    pub priorities: Vec<Priority>,
    pub allowed_statuses: Vec<Status>,
}

/// Locals of the `attributes` partial
#[derive(Debug, Clone, Serialize)]
pub struct AttributesView {
    pub work_package: WorkPackage,
    pub project: Project,
    pub priorities: Vec<Priority>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    Show(Box<ShowView>),
    New(Box<NewView>),
    Attributes(Box<AttributesView>),
}

/// Result of a work package action
#[derive(Debug, Clone)]
pub enum Outcome {
    Redirect {
        location: String,
        flash: Flash,
    },
    /// Full template; non-empty `errors` mean the submitted record was rejected
    Render {
        template: &'static str,
        view: View,
        errors: ValidationErrors,
        flash: Flash,
    },
    Partial {
        partial: &'static str,
        view: View,
    },
    /// Parameter errors that stop the action before its view is built
    Errors(ValidationErrors),
}

impl Outcome {
    pub fn redirect_to_work_package(id: Id, flash: Flash) -> Self {
        Outcome::Redirect {
            location: work_package_path(id),
            flash,
        }
    }

    pub fn render(template: &'static str, view: View) -> Self {
        Outcome::Render {
            template,
            view,
            errors: ValidationErrors::new(),
            flash: Flash::default(),
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Outcome::Redirect { .. })
    }
}

/// Canonical location of a work package
pub fn work_package_path(id: Id) -> String {
    format!("/work_packages/{id}")
}
