//! Request parameters of the work package actions

use op_attachments::UploadedFile;
use op_core::error::OpError;
use op_core::result::OpResult;
use op_core::traits::Id;
use serde_json::{Map, Value};

/// Raw parameters of one work package request.
///
/// Values stay as submitted; the request handler interprets them.
#[derive(Debug, Clone, Default)]
pub struct WorkPackageParams {
    pub id: Option<Id>,
    /// Numeric id or identifier of the project
    pub project_id: Option<String>,
    pub type_id: Option<String>,
    pub sti_type: Option<String>,
    /// Unix timestamp for the planning element listing
    pub at: Option<String>,
    pub copy_from: Option<Id>,
    pub format: Option<String>,
    pub work_package: Option<Map<String, Value>>,
    /// Legacy attribute map of the `new` form
    pub issue: Option<Map<String, Value>>,
    pub send_notification: Option<String>,
    pub attachments: Vec<UploadedFile>,
}

impl WorkPackageParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: Id) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_project_id(mut self, project_id: impl ToString) -> Self {
        self.project_id = Some(project_id.to_string());
        self
    }

    pub fn with_type_id(mut self, type_id: impl ToString) -> Self {
        self.type_id = Some(type_id.to_string());
        self
    }

    pub fn with_sti_type(mut self, sti_type: impl Into<String>) -> Self {
        self.sti_type = Some(sti_type.into());
        self
    }

    pub fn with_at(mut self, at: impl Into<String>) -> Self {
        self.at = Some(at.into());
        self
    }

    pub fn with_copy_from(mut self, copy_from: Id) -> Self {
        self.copy_from = Some(copy_from);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_work_package(mut self, attributes: Map<String, Value>) -> Self {
        self.work_package = Some(attributes);
        self
    }

    pub fn with_issue(mut self, attributes: Map<String, Value>) -> Self {
        self.issue = Some(attributes);
        self
    }

    pub fn with_send_notification(mut self, value: impl Into<String>) -> Self {
        self.send_notification = Some(value.into());
        self
    }

    pub fn with_attachment(mut self, file: UploadedFile) -> Self {
        self.attachments.push(file);
        self
    }

    /// `sti_type` of the query, else of the attribute map.
    ///
    /// Only an absent or `null` value counts as not given; any other
    /// non-string value is an unsupported variant.
    pub fn requested_sti_type(&self) -> OpResult<Option<&str>> {
        if let Some(sti_type) = self.sti_type.as_deref() {
            return Ok(Some(sti_type));
        }

        match self.work_package.as_ref().and_then(|wp| wp.get("sti_type")) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(OpError::unsupported_variant(other.to_string())),
        }
    }

    /// Attribute map of a create request (legacy fallback: `issue`)
    pub fn submitted_attributes(&self) -> Map<String, Value> {
        self.work_package
            .as_ref()
            .or(self.issue.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    /// Only an explicit `"0"` turns notifications off
    pub fn send_notification(&self) -> bool {
        self.send_notification.as_deref() != Some("0")
    }

    pub fn is_js(&self) -> bool {
        self.format.as_deref() == Some("js")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_send_notification_flag() {
        assert!(WorkPackageParams::new().send_notification());
        assert!(WorkPackageParams::new().with_send_notification("1").send_notification());
        assert!(WorkPackageParams::new().with_send_notification("").send_notification());
        assert!(WorkPackageParams::new().with_send_notification("false").send_notification());
        assert!(!WorkPackageParams::new().with_send_notification("0").send_notification());
    }

    #[test]
    fn test_sti_type_lookup_order() {
        let nested = WorkPackageParams::new().with_work_package(map(json!({"sti_type": "PlanningElement"})));
        assert_eq!(nested.requested_sti_type().unwrap(), Some("PlanningElement"));

        let both = nested.with_sti_type("Issue");
        assert_eq!(both.requested_sti_type().unwrap(), Some("Issue"));

        assert_eq!(WorkPackageParams::new().requested_sti_type().unwrap(), None);

        let null = WorkPackageParams::new().with_work_package(map(json!({"sti_type": null})));
        assert_eq!(null.requested_sti_type().unwrap(), None);
    }

    #[test]
    fn test_non_string_sti_type_is_unsupported() {
        for value in [json!(5), json!(true), json!(["PlanningElement"]), json!({"name": "Issue"})] {
            let params = WorkPackageParams::new().with_work_package(map(json!({"sti_type": value})));
            assert!(matches!(
                params.requested_sti_type(),
                Err(OpError::UnsupportedVariant { .. })
            ));
        }
    }

    #[test]
    fn test_issue_map_is_legacy_fallback() {
        let legacy = WorkPackageParams::new().with_issue(map(json!({"subject": "Legacy"})));
        assert_eq!(legacy.submitted_attributes().get("subject"), Some(&json!("Legacy")));

        let current = legacy.with_work_package(map(json!({"subject": "Current"})));
        assert_eq!(current.submitted_attributes().get("subject"), Some(&json!("Current")));
    }
}
