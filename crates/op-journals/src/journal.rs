//! Journal Model

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use op_core::traits::Id;
use op_models::WorkPackage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Journal version, counting from 1 per journable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JournalVersion(pub i32);

impl JournalVersion {
    pub fn initial() -> Self {
        Self(1)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<i32> for JournalVersion {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

/// Old and new value of one attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub old: Value,
    pub new: Value,
}

/// A journal entry (audit record) of a work package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    pub id: Option<Id>,
    pub journable_id: Id,
    pub version: JournalVersion,
    pub user_id: Id,
    pub notes: Option<String>,
    /// Changed attributes by name
    #[serde(default)]
    pub details: BTreeMap<String, AttributeChange>,
    pub created_at: DateTime<Utc>,
}

impl Journal {
    pub fn new(journable_id: Id, version: JournalVersion, user_id: Id) -> Self {
        Self {
            id: None,
            journable_id,
            version,
            user_id,
            notes: None,
            details: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Journal recording the creation of `wp`; every set attribute is a change
    /// from null.
    pub fn for_creation(wp: &WorkPackage, journable_id: Id, user_id: Id) -> Self {
        let mut journal = Self::new(journable_id, JournalVersion::initial(), user_id);
        if let Some(created_at) = wp.created_at {
            journal.created_at = created_at;
        }

        let snapshot = serde_json::to_value(wp).unwrap_or(Value::Null);
        if let Value::Object(fields) = snapshot {
            for (name, value) in fields {
                if matches!(name.as_str(), "id" | "createdAt" | "updatedAt" | "lockVersion") {
                    continue;
                }
                let empty = match &value {
                    Value::Null => true,
                    Value::String(s) => s.is_empty(),
                    Value::Array(items) => items.is_empty(),
                    _ => false,
                };
                if !empty {
                    journal.record_change(name, Value::Null, value);
                }
            }
        }
        journal
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn record_change(&mut self, attribute: impl Into<String>, old: Value, new: Value) {
        self.details.insert(attribute.into(), AttributeChange { old, new });
    }

    pub fn is_initial(&self) -> bool {
        self.version == JournalVersion::initial()
    }

    pub fn has_notes(&self) -> bool {
        self.notes.as_ref().map_or(false, |n| !n.trim().is_empty())
    }

    /// Carries notes or at least one attribute change
    pub fn is_changing(&self) -> bool {
        self.has_notes() || !self.details.is_empty()
    }
}

/// Changing journals only, ascending by creation time (ties by version)
pub fn changing_history(journals: impl IntoIterator<Item = Journal>) -> Vec<Journal> {
    let mut history: Vec<Journal> = journals.into_iter().filter(Journal::is_changing).collect();
    history.sort_by_key(|j| (j.created_at, j.version));
    history
}
