//! User model

pub mod model;

pub use model::*;
