//! Type model (work package type)
//!
//! Table: types
//!
//! Note: Named `type_def` because `type` is a Rust reserved keyword

use chrono::{DateTime, Utc};
use op_core::config::DefaultTypeOrder;
use op_core::traits::{Entity, Id, Identifiable, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Work package type (Task, Bug, Feature, Milestone, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Type {
    pub id: Option<Id>,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub position: i32,

    #[serde(default)]
    pub is_default: bool,

    /// Milestones have a single date instead of a duration
    #[serde(default)]
    pub is_milestone: bool,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Type {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            position: 0,
            is_default: false,
            is_milestone: false,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Identifiable for Type {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for Type {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for Type {
    const TABLE_NAME: &'static str = "types";
    const TYPE_NAME: &'static str = "Type";
}

impl Type {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// First type of `types` under the configured ordering
    pub fn first_by(types: &[Type], order: DefaultTypeOrder) -> Option<&Type> {
        match order {
            DefaultTypeOrder::Position => types.iter().min_by_key(|t| (t.position, t.id)),
            DefaultTypeOrder::Id => types.iter().min_by_key(|t| t.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types() -> Vec<Type> {
        vec![
            Type {
                id: Some(1),
                position: 3,
                ..Type::new("Bug")
            },
            Type {
                id: Some(2),
                position: 1,
                ..Type::new("Feature")
            },
            Type {
                id: Some(3),
                position: 2,
                ..Type::new("Support")
            },
        ]
    }

    #[test]
    fn test_first_by_position() {
        let types = types();
        let first = Type::first_by(&types, DefaultTypeOrder::Position);
        assert_eq!(first.and_then(|t| t.id), Some(2));
    }

    #[test]
    fn test_first_by_id() {
        let types = types();
        let first = Type::first_by(&types, DefaultTypeOrder::Id);
        assert_eq!(first.and_then(|t| t.id), Some(1));
    }

    #[test]
    fn test_first_of_nothing() {
        assert!(Type::first_by(&[], DefaultTypeOrder::Position).is_none());
    }
}
