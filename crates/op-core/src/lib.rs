//! # op-core
//!
//! Core types, traits, and utilities for OpenProject RS.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types
//! - The `OpResult` alias
//! - Core traits (Identifiable, Timestamped, ProjectScoped)
//! - Configuration types

pub mod error;
pub mod result;
pub mod traits;
pub mod config;

pub use error::*;
pub use result::*;
pub use traits::*;
