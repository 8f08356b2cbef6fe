//! Request handlers

pub mod work_packages;
