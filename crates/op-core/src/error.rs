//! Core error types for OpenProject RS
//!
//! `OpError` is the error taxonomy shared by all crates; `ValidationErrors`
//! collects field and base errors of a rejected record.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Core error type for all OpenProject operations
#[derive(Error, Debug)]
pub enum OpError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("sti_type {value} is not supported")]
    UnsupportedVariant { value: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl OpError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        OpError::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        OpError::Forbidden {
            message: message.into(),
        }
    }

    pub fn unsupported_variant(value: impl Into<String>) -> Self {
        OpError::UnsupportedVariant {
            value: value.into(),
        }
    }
}

/// Field and base validation errors
#[derive(Error, Debug, Default, Clone, PartialEq, Serialize)]
#[error("Validation errors: {errors:?}")]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: BTreeMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Get errors for a specific field
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// `Ok(())` when empty, otherwise the collected errors
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// HTTP status code mapping for errors
impl OpError {
    pub fn status_code(&self) -> u16 {
        match self {
            OpError::NotFound { .. } => 404,
            OpError::UnsupportedVariant { .. } => 400,
            OpError::Unauthorized { .. } => 401,
            OpError::Forbidden { .. } => 403,
            OpError::Validation(_) => 422,
            OpError::Database(_) | OpError::Internal(_) | OpError::Config(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            OpError::NotFound { .. } => "not_found",
            OpError::UnsupportedVariant { .. } => "unsupported_variant",
            OpError::Unauthorized { .. } => "unauthorized",
            OpError::Forbidden { .. } => "forbidden",
            OpError::Validation(_) => "validation_failed",
            OpError::Database(_) => "database_error",
            OpError::Internal(_) => "internal_error",
            OpError::Config(_) => "configuration_error",
        }
    }
}
