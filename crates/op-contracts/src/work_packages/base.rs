//! Base contract for work packages

use op_core::error::ValidationErrors;
use op_models::{Project, WorkPackage, WorkPackageKind};
use validator::Validate;

use crate::base::{Contract, UserContext, ValidationResult};

/// Validations shared by every work package contract
pub struct WorkPackageBaseContract<'a, U: UserContext> {
    user: &'a U,
    project: &'a Project,
}

impl<'a, U: UserContext> WorkPackageBaseContract<'a, U> {
    pub fn new(user: &'a U, project: &'a Project) -> Self {
        Self { user, project }
    }

    pub fn user(&self) -> &'a U {
        self.user
    }

    pub fn project(&self) -> &'a Project {
        self.project
    }

    /// Copy the derive-level validations into `errors`
    fn validate_fields(&self, wp: &WorkPackage, errors: &mut ValidationErrors) {
        let Err(field_errors) = wp.validate() else {
            return;
        };

        for (field, failures) in field_errors.field_errors() {
            for failure in failures {
                let message = match failure.code.as_ref() {
                    "length" => "is too long (maximum is 255 characters)",
                    "range" if field == "done_ratio" => "must be between 0 and 100",
                    "range" => "must be greater than or equal to 0",
                    _ => "is invalid",
                };
                errors.add(field, message);
            }
        }
    }

    fn validate_subject(&self, subject: &str, errors: &mut ValidationErrors) {
        if subject.trim().is_empty() {
            errors.add("subject", "can't be blank");
        }
    }

    fn validate_project(&self, wp: &WorkPackage, errors: &mut ValidationErrors) {
        if Some(wp.project_id) != self.project.id {
            errors.add("project", "is invalid");
        }
    }

    fn validate_type(&self, wp: &WorkPackage, errors: &mut ValidationErrors) {
        match wp.type_id {
            None => errors.add("type", "can't be blank"),
            Some(type_id) if !self.project.type_ids.contains(&type_id) => {
                errors.add("type_id", "is not included in the list")
            }
            Some(_) => {}
        }
    }

    fn validate_required_refs(&self, wp: &WorkPackage, errors: &mut ValidationErrors) {
        if wp.status_id.is_none() {
            errors.add("status", "can't be blank");
        }
        if wp.priority_id.is_none() {
            errors.add("priority", "can't be blank");
        }
    }

    fn validate_dates(&self, wp: &WorkPackage, errors: &mut ValidationErrors) {
        match wp.kind {
            WorkPackageKind::Issue => {}
            WorkPackageKind::PlanningElement => {
                if wp.start_date.is_none() {
                    errors.add("start_date", "can't be blank");
                }
                if wp.due_date.is_none() {
                    errors.add("due_date", "can't be blank");
                }
            }
        }

        if let (Some(start), Some(due)) = (wp.start_date, wp.due_date) {
            if due < start {
                errors.add("due_date", "must be greater than start date");
            }
        }
    }
}

impl<'a, U: UserContext> Contract<WorkPackage> for WorkPackageBaseContract<'a, U> {
    fn validate(&self, entity: &WorkPackage) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_subject(&entity.subject, &mut errors);
        self.validate_fields(entity, &mut errors);
        self.validate_project(entity, &mut errors);
        self.validate_type(entity, &mut errors);
        self.validate_required_refs(entity, &mut errors);
        self.validate_dates(entity, &mut errors);

        errors.into_result()
    }
}
