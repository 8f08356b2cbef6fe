//! Typed attribute set for assigning request values to a work package
//!
//! Every field is `None` when the request did not mention the attribute.
//! Nullable attributes use `Option<Option<T>>` so an explicit blank value can
//! clear the attribute.

use chrono::NaiveDate;
use op_core::error::ValidationErrors;
use op_core::traits::Id;
use serde_json::{Map, Value};

use super::model::WorkPackage;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkPackageAttributes {
    pub subject: Option<String>,
    pub description: Option<Option<String>>,
    pub type_id: Option<Option<Id>>,
    pub status_id: Option<Option<Id>>,
    pub priority_id: Option<Option<Id>>,
    pub author_id: Option<Id>,
    pub assigned_to_id: Option<Option<Id>>,
    pub responsible_id: Option<Option<Id>>,
    pub fixed_version_id: Option<Option<Id>>,
    pub category_id: Option<Option<Id>>,
    pub parent_id: Option<Option<Id>>,
    pub start_date: Option<Option<NaiveDate>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub estimated_hours: Option<Option<f64>>,
    pub done_ratio: Option<i32>,
    pub watcher_user_ids: Option<Vec<Id>>,
}

const INVALID: &str = "is invalid";

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn parse_id(value: &Value) -> Option<Option<Id>> {
    if is_blank(value) {
        return Some(None);
    }
    match value {
        Value::Number(n) => n.as_i64().map(Some),
        Value::String(s) => s.trim().parse().ok().map(Some),
        _ => None,
    }
}

fn parse_date(value: &Value) -> Option<Option<NaiveDate>> {
    if is_blank(value) {
        return Some(None);
    }
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        .map(Some)
}

fn parse_float(value: &Value) -> Option<Option<f64>> {
    if is_blank(value) {
        return Some(None);
    }
    match value {
        Value::Number(n) => n.as_f64().map(Some),
        Value::String(s) => s.trim().parse().ok().map(Some),
        _ => None,
    }
}

fn parse_text(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        _ => None,
    }
}

fn parse_ids(value: &Value) -> Option<Vec<Id>> {
    let items = value.as_array()?;
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        // forms submit an empty string alongside checkbox arrays
        match parse_id(item)? {
            Some(id) => ids.push(id),
            None => continue,
        }
    }
    Some(ids)
}

impl WorkPackageAttributes {
    /// Every attribute name this type understands
    pub const KEYS: &'static [&'static str] = &[
        "subject",
        "description",
        "type_id",
        "status_id",
        "priority_id",
        "author_id",
        "assigned_to_id",
        "responsible_id",
        "fixed_version_id",
        "category_id",
        "parent_id",
        "start_date",
        "due_date",
        "estimated_hours",
        "done_ratio",
        "watcher_user_ids",
    ];

    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (permission-filtered) request map.
    ///
    /// Unknown keys are ignored; malformed values of known keys become
    /// `is invalid` errors on that field.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        let (attrs, errors) = Self::parse(map);
        errors.into_result().map(|_| attrs)
    }

    /// Like [`from_map`](Self::from_map), but keeps the well-formed
    /// attributes next to the errors of the malformed ones
    pub fn parse(map: &Map<String, Value>) -> (Self, ValidationErrors) {
        let mut attrs = Self::default();
        let mut errors = ValidationErrors::new();

        for (key, value) in map {
            let ok = match key.as_str() {
                "subject" => parse_text(value)
                    .map(|s| attrs.subject = Some(s.unwrap_or_default()))
                    .is_some(),
                "description" => parse_text(value).map(|v| attrs.description = Some(v)).is_some(),
                "type_id" => parse_id(value).map(|v| attrs.type_id = Some(v)).is_some(),
                "status_id" => parse_id(value).map(|v| attrs.status_id = Some(v)).is_some(),
                "priority_id" => parse_id(value).map(|v| attrs.priority_id = Some(v)).is_some(),
                "author_id" => match parse_id(value) {
                    Some(Some(id)) => {
                        attrs.author_id = Some(id);
                        true
                    }
                    _ => false,
                },
                "assigned_to_id" => parse_id(value).map(|v| attrs.assigned_to_id = Some(v)).is_some(),
                "responsible_id" => parse_id(value).map(|v| attrs.responsible_id = Some(v)).is_some(),
                "fixed_version_id" => parse_id(value).map(|v| attrs.fixed_version_id = Some(v)).is_some(),
                "category_id" => parse_id(value).map(|v| attrs.category_id = Some(v)).is_some(),
                "parent_id" => parse_id(value).map(|v| attrs.parent_id = Some(v)).is_some(),
                "start_date" => parse_date(value).map(|v| attrs.start_date = Some(v)).is_some(),
                "due_date" => parse_date(value).map(|v| attrs.due_date = Some(v)).is_some(),
                "estimated_hours" => parse_float(value).map(|v| attrs.estimated_hours = Some(v)).is_some(),
                "done_ratio" => match parse_id(value) {
                    Some(v) => match i32::try_from(v.unwrap_or(0)) {
                        Ok(ratio) => {
                            attrs.done_ratio = Some(ratio);
                            true
                        }
                        Err(_) => false,
                    },
                    None => false,
                },
                "watcher_user_ids" => parse_ids(value).map(|v| attrs.watcher_user_ids = Some(v)).is_some(),
                _ => true,
            };

            if !ok {
                errors.add(key.clone(), INVALID);
            }
        }

        (attrs, errors)
    }

    pub fn with_author(mut self, author_id: Id) -> Self {
        self.author_id = Some(author_id);
        self
    }

    /// Assign every present attribute to the work package
    pub fn apply_to(&self, wp: &mut WorkPackage) {
        if let Some(ref subject) = self.subject {
            wp.subject = subject.clone();
        }
        if let Some(ref description) = self.description {
            wp.description = description.clone();
        }
        if let Some(type_id) = self.type_id {
            wp.type_id = type_id;
        }
        if let Some(status_id) = self.status_id {
            wp.status_id = status_id;
        }
        if let Some(priority_id) = self.priority_id {
            wp.priority_id = priority_id;
        }
        if let Some(author_id) = self.author_id {
            wp.author_id = Some(author_id);
        }
        if let Some(assigned_to_id) = self.assigned_to_id {
            wp.assigned_to_id = assigned_to_id;
        }
        if let Some(responsible_id) = self.responsible_id {
            wp.responsible_id = responsible_id;
        }
        if let Some(fixed_version_id) = self.fixed_version_id {
            wp.fixed_version_id = fixed_version_id;
        }
        if let Some(category_id) = self.category_id {
            wp.category_id = category_id;
        }
        if let Some(parent_id) = self.parent_id {
            wp.parent_id = parent_id;
        }
        if let Some(start_date) = self.start_date {
            wp.start_date = start_date;
        }
        if let Some(due_date) = self.due_date {
            wp.due_date = due_date;
        }
        if let Some(estimated_hours) = self.estimated_hours {
            wp.estimated_hours = estimated_hours;
        }
        if let Some(done_ratio) = self.done_ratio {
            wp.done_ratio = done_ratio;
        }
        if let Some(ref watchers) = self.watcher_user_ids {
            wp.watcher_user_ids = watchers.clone();
        }
    }
}
