//! Work Package model and related types
//!
//! Work packages are the central entity in OpenProject. A record is either an
//! Issue or a PlanningElement, selected by its `sti_type` discriminator.

pub mod model;
pub mod kind;
pub mod attributes;

pub use attributes::WorkPackageAttributes;
pub use kind::WorkPackageKind;
pub use model::*;
