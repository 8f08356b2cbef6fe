//! # op-auth
//!
//! Authentication and authorization for OpenProject RS.
//!
//! ## Features
//!
//! - JWT bearer authentication carrying the user's project permissions
//! - `CurrentUser`, the `UserContext` the work package handler asks

pub mod jwt;
pub mod permissions;

pub use jwt::{extract_bearer_token, Claims, JwtError, JwtService};
pub use permissions::CurrentUser;
