//! Create contract for work packages

use op_core::error::ValidationErrors;
use op_models::{Project, WorkPackage};

use super::base::WorkPackageBaseContract;
use super::permissions;
use crate::base::{Contract, UserContext, ValidationResult};

/// Contract for creating a new work package
pub struct CreateWorkPackageContract<'a, U: UserContext> {
    base: WorkPackageBaseContract<'a, U>,
}

impl<'a, U: UserContext> CreateWorkPackageContract<'a, U> {
    pub fn new(user: &'a U, project: &'a Project) -> Self {
        Self {
            base: WorkPackageBaseContract::new(user, project),
        }
    }

    fn validate_user_allowed_to_create(&self, errors: &mut ValidationErrors) {
        let project_id = self.base.project().id.unwrap_or_default();
        if !self.base.user().allowed_to(permissions::ADD_WORK_PACKAGES, project_id) {
            errors.add_base("You are not authorized to create work packages in this project");
        }
    }

    fn validate_new_record(&self, entity: &WorkPackage, errors: &mut ValidationErrors) {
        if entity.id.is_some() {
            errors.add_base("Work package has already been saved");
        }
    }

    fn validate_author(&self, entity: &WorkPackage, errors: &mut ValidationErrors) {
        if entity.author_id != Some(self.base.user().id()) {
            errors.add("author", "is invalid");
        }
    }

    pub fn base(&self) -> &WorkPackageBaseContract<'a, U> {
        &self.base
    }
}

impl<'a, U: UserContext> Contract<WorkPackage> for CreateWorkPackageContract<'a, U> {
    fn validate(&self, entity: &WorkPackage) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        // Check permissions first
        self.validate_user_allowed_to_create(&mut errors);
        self.validate_new_record(entity, &mut errors);

        if let Err(base_errors) = self.base.validate(entity) {
            errors.merge(base_errors);
        }

        self.validate_author(entity, &mut errors);

        errors.into_result()
    }
}
