//! Project model and its enabled-module names

pub mod model;

pub use model::Project;

/// Names of project modules that gate features
pub mod modules {
    pub const WORK_PACKAGE_TRACKING: &str = "work_package_tracking";
    pub const TIMELINES: &str = "timelines";
}
