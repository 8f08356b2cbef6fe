//! Notification Model

use chrono::{DateTime, Utc};
use op_core::traits::Id;
use op_models::WorkPackage;
use serde::{Deserialize, Serialize};

/// Why a user receives a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationReason {
    Assigned,
    Responsible,
    Watched,
}

impl NotificationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Responsible => "responsible",
            Self::Watched => "watched",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "assigned" => Some(Self::Assigned),
            "responsible" => Some(Self::Responsible),
            "watched" => Some(Self::Watched),
            _ => None,
        }
    }
}

/// In-app notification about a work package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Option<Id>,
    pub recipient_id: Id,
    /// Who triggered it
    pub actor_id: Option<Id>,
    pub reason: NotificationReason,
    pub resource_id: Id,
    pub project_id: Id,
    pub subject: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }

    pub fn mark_read(&mut self) {
        self.read_at = Some(Utc::now());
    }
}

/// Recipients of a creation notice with their strongest reason.
///
/// The author never notifies themself; a user who is both assignee and
/// watcher is notified once, as assignee.
pub fn recipients(wp: &WorkPackage) -> Vec<(Id, NotificationReason)> {
    let mut recipients: Vec<(Id, NotificationReason)> = wp
        .assigned_to_id
        .map(|id| (id, NotificationReason::Assigned))
        .into_iter()
        .chain(wp.responsible_id.map(|id| (id, NotificationReason::Responsible)))
        .chain(wp.watcher_user_ids.iter().map(|id| (*id, NotificationReason::Watched)))
        .filter(|(id, _)| Some(*id) != wp.author_id)
        .collect();

    recipients.sort();
    recipients.dedup_by_key(|(id, _)| *id);
    recipients
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_models::WorkPackageKind;

    #[test]
    fn test_reason_names() {
        for reason in [
            NotificationReason::Assigned,
            NotificationReason::Responsible,
            NotificationReason::Watched,
        ] {
            assert_eq!(NotificationReason::parse(reason.as_str()), Some(reason));
        }
        assert_eq!(NotificationReason::parse("mentioned"), None);
    }

    #[test]
    fn test_recipients() {
        let mut wp = WorkPackage::new(WorkPackageKind::Issue, 1);
        wp.author_id = Some(1);
        wp.assigned_to_id = Some(2);
        wp.responsible_id = Some(3);
        wp.watcher_user_ids = vec![1, 2, 4];

        assert_eq!(
            recipients(&wp),
            vec![
                (2, NotificationReason::Assigned),
                (3, NotificationReason::Responsible),
                (4, NotificationReason::Watched),
            ]
        );
    }

    #[test]
    fn test_author_alone_gets_nothing() {
        let mut wp = WorkPackage::new(WorkPackageKind::Issue, 1);
        wp.author_id = Some(1);
        wp.assigned_to_id = Some(1);
        assert!(recipients(&wp).is_empty());
    }
}
