//! # op-contracts
//!
//! Contract validation for OpenProject RS.
//!
//! Contracts validate work packages before they are saved and decide which
//! submitted attributes a user may write.

pub mod base;
pub mod work_packages;

pub use base::*;
