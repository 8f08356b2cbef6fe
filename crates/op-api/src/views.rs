//! JSON presentation of action outcomes
//!
//! A redirect becomes `303 See Other` with a `Location` header. Templates and
//! partials are rendered as their locals; a template carrying validation
//! errors answers `422`.

use axum::{
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use op_core::error::ValidationErrors;
use op_services::work_packages::{Flash, Outcome, View};
use serde::Serialize;

use crate::error::ApiError;

fn no_flash(flash: &&Flash) -> bool {
    flash.is_empty()
}

fn no_errors(errors: &&ValidationErrors) -> bool {
    errors.is_empty()
}

#[derive(Serialize)]
struct RedirectBody<'a> {
    location: &'a str,
    #[serde(skip_serializing_if = "no_flash")]
    flash: &'a Flash,
}

#[derive(Serialize)]
struct TemplateBody<'a> {
    template: &'static str,
    #[serde(flatten)]
    view: &'a View,
    #[serde(skip_serializing_if = "no_errors")]
    errors: &'a ValidationErrors,
    #[serde(skip_serializing_if = "no_flash")]
    flash: &'a Flash,
}

#[derive(Serialize)]
struct PartialBody<'a> {
    partial: &'static str,
    #[serde(flatten)]
    view: &'a View,
}

/// Turn an action outcome into the HTTP response
pub fn render(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Redirect { location, flash } => {
            let body = Json(RedirectBody {
                location: &location,
                flash: &flash,
            });
            match HeaderValue::from_str(&location) {
                Ok(value) => (StatusCode::SEE_OTHER, [(LOCATION, value)], body).into_response(),
                Err(_) => ApiError::internal(format!("invalid redirect location {location}")).into_response(),
            }
        }
        Outcome::Render {
            template,
            view,
            errors,
            flash,
        } => {
            let status = if errors.is_empty() {
                StatusCode::OK
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            let body = TemplateBody {
                template,
                view: &view,
                errors: &errors,
                flash: &flash,
            };
            (status, Json(body)).into_response()
        }
        Outcome::Partial { partial, view } => Json(PartialBody { partial, view: &view }).into_response(),
        Outcome::Errors(errors) => ApiError::Validation(errors).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_is_see_other_with_location() {
        let response = render(Outcome::redirect_to_work_package(
            12,
            Flash {
                notice: Some("Successful creation.".into()),
                warning: None,
            },
        ));

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).and_then(|v| v.to_str().ok()), Some("/work_packages/12"));
    }

    #[test]
    fn test_errors_are_unprocessable() {
        let mut errors = ValidationErrors::new();
        errors.add("at", "unknown format");
        let response = render(Outcome::Errors(errors));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
