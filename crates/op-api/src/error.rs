//! API error handling
//!
//! Errors leave the API as HAL+JSON error documents.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use op_core::error::{OpError, ValidationErrors};
use serde::Serialize;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound { resource: &'static str, id: String },
    Validation(ValidationErrors),
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound { resource, id: id.to_string() }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OpError> for ApiError {
    fn from(err: OpError) -> Self {
        match err {
            OpError::NotFound { entity, value, .. } => ApiError::NotFound { resource: entity, id: value },
            OpError::UnsupportedVariant { .. } => ApiError::BadRequest(err.to_string()),
            OpError::Unauthorized { message } => ApiError::Unauthorized(message),
            OpError::Forbidden { message } => ApiError::Forbidden(message),
            OpError::Validation(errors) => ApiError::Validation(errors),
            other => {
                tracing::error!(error = %other, "request failed");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct HalError {
    #[serde(rename = "_type")]
    type_name: &'static str,
    #[serde(rename = "errorIdentifier")]
    error_identifier: &'static str,
    message: String,
    #[serde(rename = "_embedded", skip_serializing_if = "Option::is_none")]
    embedded: Option<ValidationErrors>,
}

impl HalError {
    fn new(error_identifier: &'static str, message: String) -> Self {
        Self {
            type_name: "Error",
            error_identifier,
            message,
            embedded: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match self {
            ApiError::NotFound { resource, id } => HalError::new(
                "urn:openproject-org:api:v3:errors:NotFound",
                format!("{} with id {} not found", resource, id),
            ),
            ApiError::Validation(errors) => HalError {
                embedded: Some(errors.clone()),
                ..HalError::new(
                    "urn:openproject-org:api:v3:errors:PropertyConstraintViolation",
                    errors.full_messages().join(", "),
                )
            },
            ApiError::Unauthorized(msg) => HalError::new("urn:openproject-org:api:v3:errors:Unauthenticated", msg),
            ApiError::Forbidden(msg) => HalError::new("urn:openproject-org:api:v3:errors:MissingPermission", msg),
            ApiError::BadRequest(msg) => HalError::new("urn:openproject-org:api:v3:errors:InvalidRequestBody", msg),
            ApiError::Internal(msg) => HalError::new("urn:openproject-org:api:v3:errors:InternalError", msg),
        };

        (status, Json(error)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_op_errors_to_status_codes() {
        let cases = [
            (OpError::not_found("WorkPackage", "id", 7), StatusCode::NOT_FOUND),
            (OpError::unsupported_variant("Task"), StatusCode::BAD_REQUEST),
            (OpError::forbidden("nope"), StatusCode::FORBIDDEN),
            (
                OpError::Unauthorized { message: "who?".into() },
                StatusCode::UNAUTHORIZED,
            ),
            (OpError::Validation(ValidationErrors::new()), StatusCode::UNPROCESSABLE_ENTITY),
            (OpError::Database("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (OpError::Config("missing".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_not_found_keeps_entity_and_value() {
        let err = ApiError::from(OpError::not_found("Project", "identifier", "ecookbook"));
        assert!(matches!(err, ApiError::NotFound { resource: "Project", ref id } if id == "ecookbook"));
    }
}
