//! # op-api
//!
//! HTTP surface of the work package actions.
//!
//! Handlers translate a request into [`WorkPackageParams`](op_services::work_packages::WorkPackageParams),
//! run the matching action on a per-request
//! [`WorkPackageRequest`](op_services::work_packages::WorkPackageRequest) and turn the
//! resulting [`Outcome`](op_services::work_packages::Outcome) into a JSON response.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod views;

pub use extractors::{ApiConfig, AppState};
pub use routes::router;
