//! # op-models
//!
//! Domain models for OpenProject RS.
//!
//! This crate contains the entity structs the work package request handler
//! reads and writes. Each model implements the core traits from `op-core`
//! (Entity, Identifiable, etc.)

pub use op_core::traits::{Entity, Id, Identifiable, Timestamped, ProjectScoped, SoftDeletable};

// Core domain modules
pub mod user;
pub mod project;
pub mod work_package;
pub mod status;
pub mod type_def;
pub mod priority;
pub mod version;
pub mod relation;

// Re-exports for convenience
pub use user::model::User;
pub use project::{modules, Project};
pub use work_package::{WorkPackage, WorkPackageAttributes, WorkPackageKind};
pub use status::Status;
pub use type_def::Type;
pub use priority::Priority;
pub use version::{Version, VersionStatus};
pub use relation::{Relation, RelationKind};
