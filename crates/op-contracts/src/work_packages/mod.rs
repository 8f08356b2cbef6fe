//! Work Package contracts
//!
//! Validation contracts for creating work packages, plus the
//! permitted-attribute filter applied to submitted maps.

mod base;
mod create;
mod permitted;

pub use base::WorkPackageBaseContract;
pub use create::CreateWorkPackageContract;
pub use permitted::{permitted_attributes, ALWAYS_PERMITTED, GATED};

/// Permissions consulted by the work package request handler
pub mod permissions {
    pub const VIEW_WORK_PACKAGES: &str = "view_work_packages";
    pub const ADD_WORK_PACKAGES: &str = "add_work_packages";
    pub const CHANGE_WORK_PACKAGE_STATUS: &str = "change_work_package_status";
    pub const ASSIGN_VERSIONS: &str = "assign_versions";
    pub const ADD_WORK_PACKAGE_WATCHERS: &str = "add_work_package_watchers";
}
