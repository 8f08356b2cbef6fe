//! Work package handlers
//!
//! Each handler builds [`WorkPackageParams`] from the request, runs one
//! action and renders its outcome.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Response,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use op_attachments::UploadedFile;
use op_core::traits::Id;
use op_services::work_packages::WorkPackageParams;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{nest_query_pairs, AppState, AuthenticatedUser};
use crate::views;

#[derive(Debug, Default, Deserialize)]
pub struct ShowQuery {
    pub at: Option<String>,
    pub format: Option<String>,
}

/// Body of `POST /projects/:project_id/work_packages`
#[derive(Debug, Default, Deserialize)]
pub struct CreateWorkPackageBody {
    pub sti_type: Option<String>,
    pub type_id: Option<Value>,
    pub copy_from: Option<Id>,
    pub send_notification: Option<Value>,
    pub work_package: Option<Map<String, Value>>,
    pub issue: Option<Map<String, Value>>,
    #[serde(default)]
    pub attachments: Vec<AttachmentUpload>,
}

/// Uploaded file with base64 encoded content
#[derive(Debug, Deserialize)]
pub struct AttachmentUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub description: Option<String>,
    pub content: String,
}

impl TryFrom<AttachmentUpload> for UploadedFile {
    type Error = ApiError;

    fn try_from(upload: AttachmentUpload) -> Result<Self, Self::Error> {
        let content = STANDARD
            .decode(upload.content.as_bytes())
            .map_err(|e| ApiError::bad_request(format!("attachment {}: {}", upload.filename, e)))?;

        let mut file = UploadedFile::new(upload.filename, content);
        file.content_type = upload.content_type;
        file.description = upload.description;
        Ok(file)
    }
}

/// GET /work_packages/:id
pub async fn show(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Id>,
    Query(query): Query<ShowQuery>,
) -> ApiResult<Response> {
    let params = WorkPackageParams {
        at: query.at,
        format: query.format,
        ..WorkPackageParams::new().with_id(id)
    };

    let mut request = state.handler.request(&user.0, params);
    Ok(views::render(request.show().await?))
}

/// GET /projects/:project_id/work_packages/new
pub async fn new(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(project_id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Response> {
    let params = form_params(project_id, nest_query_pairs(pairs))?;

    let mut request = state.handler.request(&user.0, params);
    Ok(views::render(request.new_form().await?))
}

/// GET /projects/:project_id/work_packages/new_type
pub async fn new_type(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(project_id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Response> {
    let params = form_params(project_id, nest_query_pairs(pairs))?;

    let mut request = state.handler.request(&user.0, params);
    Ok(views::render(request.new_type().await?))
}

/// POST /projects/:project_id/work_packages
///
/// Query parameters are merged under the JSON body; the body wins.
pub async fn create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(project_id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    body: Result<Json<CreateWorkPackageBody>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let query = form_params(project_id, nest_query_pairs(pairs))?;
    let params = create_params(query, body)?;

    tracing::info!(
        user_id = user.id,
        project = params.project_id.as_deref().unwrap_or_default(),
        attachments = params.attachments.len(),
        "creating work package"
    );

    let mut request = state.handler.request(&user.0, params);
    Ok(views::render(request.create().await?))
}

fn create_params(query: WorkPackageParams, body: CreateWorkPackageBody) -> ApiResult<WorkPackageParams> {
    let attachments = body
        .attachments
        .into_iter()
        .map(UploadedFile::try_from)
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(WorkPackageParams {
        sti_type: body.sti_type.or(query.sti_type),
        type_id: body.type_id.as_ref().and_then(flag_value).or(query.type_id),
        copy_from: body.copy_from.or(query.copy_from),
        send_notification: body
            .send_notification
            .as_ref()
            .and_then(flag_value)
            .or(query.send_notification),
        work_package: merge_attributes(query.work_package, body.work_package),
        issue: merge_attributes(query.issue, body.issue),
        attachments,
        ..query
    })
}

/// Body attributes over query attributes
fn merge_attributes(
    query: Option<Map<String, Value>>,
    body: Option<Map<String, Value>>,
) -> Option<Map<String, Value>> {
    match (query, body) {
        (Some(mut merged), Some(body)) => {
            merged.extend(body);
            Some(merged)
        }
        (query, body) => body.or(query),
    }
}

/// Parameters of the `new` form from nested query values
fn form_params(project_id: String, mut query: Map<String, Value>) -> ApiResult<WorkPackageParams> {
    let mut text = |key: &str| match query.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    };

    let id = text("id").map(|v| parse_id("id", &v)).transpose()?;
    let copy_from = text("copy_from").map(|v| parse_id("copy_from", &v)).transpose()?;
    let type_id = text("type_id");
    let sti_type = text("sti_type");
    let send_notification = text("send_notification");
    let format = text("format");

    Ok(WorkPackageParams {
        id,
        project_id: Some(project_id),
        type_id,
        sti_type,
        copy_from,
        send_notification,
        format,
        work_package: object(query.remove("work_package")),
        issue: object(query.remove("issue")),
        ..WorkPackageParams::new()
    })
}

fn parse_id(key: &str, value: &str) -> ApiResult<Id> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("{key} must be a number")))
}

fn object(value: Option<Value>) -> Option<Map<String, Value>> {
    match value {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// `send_notification` as the form would submit it
fn flag_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}
