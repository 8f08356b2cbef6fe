//! Planning element listing of the `show` view and its `at` filter

use chrono::{DateTime, Utc};
use op_contracts::base::UserContext;
use op_core::result::OpResult;
use op_db::PlanningElementScope;
use op_models::WorkPackage;
use tracing::debug;

use super::request::WorkPackageRequest;

pub const UNKNOWN_FORMAT: &str = "unknown format";

/// The `at` parameter is not an integer timestamp in the supported range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedTimestamp;

/// Parse an integer Unix timestamp; blank input is `Ok(None)`.
///
/// Surrounding whitespace and a leading sign are accepted.
pub fn parse_timestamp(raw: &str) -> Result<Option<DateTime<Utc>>, MalformedTimestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let seconds: i64 = raw.parse().map_err(|_| MalformedTimestamp)?;
    DateTime::from_timestamp(seconds, 0).map(Some).ok_or(MalformedTimestamp)
}

impl<'a, U: UserContext> WorkPackageRequest<'a, U> {
    pub fn planning_element_scope(&self) -> PlanningElementScope {
        self.planning_element_scope
    }

    /// Narrow the listing to planning elements existing at `raw`.
    ///
    /// Blank input leaves the scope unchanged. Unparsable input records
    /// the field error `at` and also leaves the scope unchanged.
    pub fn apply_at_timestamp(&mut self, raw: &str) {
        match parse_timestamp(raw) {
            Ok(None) => {}
            Ok(Some(at)) => {
                debug!(%at, "listing planning elements at timestamp");
                self.planning_element_scope = PlanningElementScope::AtTime(at);
            }
            Err(MalformedTimestamp) => {
                debug!(raw, "unparsable at parameter");
                self.errors.add("at", UNKNOWN_FORMAT);
            }
        }
    }

    /// Planning elements of the request's project under the current scope
    pub async fn planning_elements(&mut self) -> OpResult<Vec<WorkPackage>> {
        let project_id = self.project().await?.id.unwrap_or_default();
        Ok(self
            .store()
            .planning_elements(project_id, self.planning_element_scope)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::params::WorkPackageParams;
    use super::super::test_support::{seeded_store, TestUser};
    use super::*;
    use crate::work_packages::WorkPackageHandler;
    use chrono::TimeZone;
    use op_models::WorkPackageKind;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp(""), Ok(None));
        assert_eq!(parse_timestamp("   "), Ok(None));
        assert_eq!(
            parse_timestamp("1700000000"),
            Ok(Some(Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()))
        );
        assert_eq!(parse_timestamp(" +0 "), Ok(DateTime::from_timestamp(0, 0)));
        assert_eq!(parse_timestamp("-86400"), Ok(DateTime::from_timestamp(-86400, 0)));
        assert!(parse_timestamp("not-a-number").is_err());
        assert!(parse_timestamp("12.5").is_err());
        assert!(parse_timestamp("99999999999999999").is_err());
    }

    #[tokio::test]
    async fn test_apply_at_timestamp() {
        let handler = WorkPackageHandler::in_memory(seeded_store().await);
        let user = TestUser::admin(1);
        let mut request = handler.request(&user, WorkPackageParams::new());

        request.apply_at_timestamp("");
        assert_eq!(request.planning_element_scope(), PlanningElementScope::WithoutDeleted);
        assert!(request.errors().is_empty());

        request.apply_at_timestamp("not-a-number");
        assert_eq!(request.planning_element_scope(), PlanningElementScope::WithoutDeleted);
        assert_eq!(request.errors().get("at"), Some(&vec![UNKNOWN_FORMAT.to_string()]));

        request.apply_at_timestamp("1700000000");
        assert_eq!(
            request.planning_element_scope(),
            PlanningElementScope::AtTime(Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap())
        );
    }

    #[tokio::test]
    async fn test_listing_follows_scope() {
        let store = seeded_store().await;
        let at = |year| Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
        for (id, created, deleted) in [(30, 2010, None), (31, 2010, Some(2012)), (32, 2014, None)] {
            let mut pe = WorkPackage::new(WorkPackageKind::PlanningElement, 1);
            pe.id = Some(id);
            pe.created_at = Some(at(created));
            pe.deleted_at = deleted.map(at);
            store.insert_work_package(pe).await.unwrap();
        }
        let handler = WorkPackageHandler::in_memory(store);
        let user = TestUser::admin(1);

        let mut request = handler.request(&user, WorkPackageParams::new().with_project_id(1));
        let current: Vec<_> = request.planning_elements().await.unwrap().iter().filter_map(|wp| wp.id).collect();
        assert_eq!(current, vec![30, 32]);

        request.apply_at_timestamp(&at(2011).timestamp().to_string());
        let then: Vec<_> = request.planning_elements().await.unwrap().iter().filter_map(|wp| wp.id).collect();
        assert_eq!(then, vec![30, 31]);
    }
}
