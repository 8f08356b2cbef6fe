//! Work package discriminator (`sti_type`)

use std::fmt;
use std::str::FromStr;

use op_core::error::OpError;
use serde::{Deserialize, Serialize};

/// Concrete variant of a work package.
///
/// The set is closed: adding a variant forces every `match` on it to be
/// revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkPackageKind {
    #[default]
    Issue,
    PlanningElement,
}

impl WorkPackageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issue => "Issue",
            Self::PlanningElement => "PlanningElement",
        }
    }
}

impl fmt::Display for WorkPackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkPackageKind {
    type Err = OpError;

    /// Exact, case-sensitive match on the class name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Issue" => Ok(Self::Issue),
            "PlanningElement" => Ok(Self::PlanningElement),
            other => Err(OpError::unsupported_variant(other)),
        }
    }
}
