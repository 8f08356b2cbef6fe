//! # op-services
//!
//! Business logic for OpenProject RS.
//!
//! The work package request handler lives in [`work_packages`]: it resolves
//! the project and work package of a request, authorizes the acting user,
//! builds and saves new work packages and loads the associations the views
//! need. Each action returns a [`work_packages::Outcome`] that the HTTP
//! layer renders.

pub mod base;
pub mod work_packages;

pub use base::*;
