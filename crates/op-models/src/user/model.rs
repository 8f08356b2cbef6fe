//! User model
//!
//! Table: users

use chrono::{DateTime, Utc};
use op_core::traits::{Entity, Id, Identifiable, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Registered,
    Locked,
}

/// User entity
///
/// Authors, assignees and journal writers all resolve to this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct User {
    pub id: Option<Id>,

    #[validate(length(min = 1, max = 255))]
    pub login: String,

    #[validate(length(max = 255))]
    pub firstname: String,

    #[validate(length(max = 255))]
    pub lastname: String,

    #[validate(email)]
    pub mail: String,

    #[serde(default)]
    pub admin: bool,

    #[serde(default)]
    pub status: UserStatus,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: None,
            login: String::new(),
            firstname: String::new(),
            lastname: String::new(),
            mail: String::new(),
            admin: false,
            status: UserStatus::Active,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Identifiable for User {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for User {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for User {
    const TABLE_NAME: &'static str = "users";
    const TYPE_NAME: &'static str = "User";
}

impl User {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            ..Default::default()
        }
    }

    /// Full name, falling back to the login
    pub fn name(&self) -> String {
        let full = format!("{} {}", self.firstname, self.lastname);
        let full = full.trim();
        if full.is_empty() {
            self.login.clone()
        } else {
            full.to_string()
        }
    }

    pub fn active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn locked(&self) -> bool {
        self.status == UserStatus::Locked
    }
}
