//! Work package relations
//!
//! Table: relations

use std::fmt;
use std::str::FromStr;

use op_core::error::OpError;
use op_core::traits::{Entity, Id, Identifiable};
use serde::{Deserialize, Serialize};

/// Kind of a directed relation edge, including the inverse readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Relates,
    Duplicates,
    Duplicated,
    Blocks,
    Blocked,
    Precedes,
    Follows,
    Includes,
    Partof,
    Requires,
    Required,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relates => "relates",
            Self::Duplicates => "duplicates",
            Self::Duplicated => "duplicated",
            Self::Blocks => "blocks",
            Self::Blocked => "blocked",
            Self::Precedes => "precedes",
            Self::Follows => "follows",
            Self::Includes => "includes",
            Self::Partof => "partof",
            Self::Requires => "requires",
            Self::Required => "required",
        }
    }

    /// The same edge read from the other endpoint
    pub fn inverse(&self) -> Self {
        match self {
            Self::Relates => Self::Relates,
            Self::Duplicates => Self::Duplicated,
            Self::Duplicated => Self::Duplicates,
            Self::Blocks => Self::Blocked,
            Self::Blocked => Self::Blocks,
            Self::Precedes => Self::Follows,
            Self::Follows => Self::Precedes,
            Self::Includes => Self::Partof,
            Self::Partof => Self::Includes,
            Self::Requires => Self::Required,
            Self::Required => Self::Requires,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "relates" => Self::Relates,
            "duplicates" => Self::Duplicates,
            "duplicated" => Self::Duplicated,
            "blocks" => Self::Blocks,
            "blocked" => Self::Blocked,
            "precedes" => Self::Precedes,
            "follows" => Self::Follows,
            "includes" => Self::Includes,
            "partof" => Self::Partof,
            "requires" => Self::Requires,
            "required" => Self::Required,
            other => return Err(OpError::Internal(format!("unknown relation type {other}"))),
        };
        Ok(kind)
    }
}

/// Directed edge `from_id -> to_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: Option<Id>,
    pub from_id: Id,
    pub to_id: Id,
    #[serde(rename = "type")]
    pub kind: RelationKind,
    /// Days between the endpoints (precedes/follows)
    pub lag: Option<i32>,
}

impl Relation {
    pub fn new(from_id: Id, to_id: Id, kind: RelationKind) -> Self {
        Self {
            id: None,
            from_id,
            to_id,
            kind,
            lag: None,
        }
    }

    pub fn involves(&self, wp_id: Id) -> bool {
        self.from_id == wp_id || self.to_id == wp_id
    }

    /// The endpoint that is not `wp_id`
    pub fn other_end(&self, wp_id: Id) -> Id {
        if self.from_id == wp_id {
            self.to_id
        } else {
            self.from_id
        }
    }

    /// Relation kind as seen from `wp_id`
    pub fn kind_for(&self, wp_id: Id) -> RelationKind {
        if self.from_id == wp_id {
            self.kind
        } else {
            self.kind.inverse()
        }
    }
}

impl Identifiable for Relation {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Entity for Relation {
    const TABLE_NAME: &'static str = "relations";
    const TYPE_NAME: &'static str = "Relation";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_end() {
        let relation = Relation::new(1, 2, RelationKind::Blocks);
        assert_eq!(relation.other_end(1), 2);
        assert_eq!(relation.other_end(2), 1);
    }

    #[test]
    fn test_kind_for_reads_inverse_from_target() {
        let relation = Relation::new(1, 2, RelationKind::Precedes);
        assert_eq!(relation.kind_for(1), RelationKind::Precedes);
        assert_eq!(relation.kind_for(2), RelationKind::Follows);
    }

    #[test]
    fn test_parse() {
        assert_eq!("partof".parse::<RelationKind>().ok(), Some(RelationKind::Partof));
        assert!("sibling".parse::<RelationKind>().is_err());
    }
}
