//! API routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::extractors::AppState;
use crate::handlers::work_packages;

/// Create the complete API router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/work_packages/:id", get(work_packages::show))
        .nest("/projects/:project_id/work_packages", project_work_packages_router())
}

fn project_work_packages_router() -> Router<AppState> {
    Router::new()
        .route("/", post(work_packages::create))
        .route("/new", get(work_packages::new))
        .route("/new_type", get(work_packages::new_type))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use op_auth::{CurrentUser, JwtService};
    use op_db::{MemoryWorkPackageStore, WorkPackageStore};
    use op_models::{modules, Priority, Project, Status, Type, User, WorkPackage, WorkPackageKind};
    use op_services::work_packages::WorkPackageHandler;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::extractors::ApiConfig;

    const SECRET: &[u8] = b"router-test-secret-at-least-32-bytes";

    async fn store() -> Arc<MemoryWorkPackageStore> {
        let store = MemoryWorkPackageStore::new();
        store
            .insert_project(Project {
                id: Some(1),
                enabled_modules: vec![modules::WORK_PACKAGE_TRACKING.to_string()],
                type_ids: vec![1],
                ..Project::new("ecookbook", "eCookbook")
            })
            .await
            .unwrap();
        store
            .insert_type(Type {
                id: Some(1),
                ..Type::new("Bug")
            })
            .await;
        store
            .insert_status(Status {
                id: Some(1),
                is_default: true,
                ..Status::new("New")
            })
            .await;
        store
            .insert_priority(Priority {
                id: Some(1),
                is_default: true,
                ..Priority::new("Normal")
            })
            .await;
        store
            .insert_user(User {
                id: Some(2),
                ..User::new("jsmith")
            })
            .await
            .unwrap();

        let mut wp = WorkPackage::new(WorkPackageKind::Issue, 1);
        wp.id = Some(10);
        wp.subject = "Existing".into();
        wp.type_id = Some(1);
        store.insert_work_package(wp).await.unwrap();

        Arc::new(store)
    }

    fn app(store: Arc<MemoryWorkPackageStore>) -> Router {
        let state = AppState::new(WorkPackageHandler::in_memory(store), JwtService::new(SECRET), ApiConfig::default());
        router().with_state(state)
    }

    fn token(permissions: &[&str]) -> String {
        let user = CurrentUser::new(2, "jsmith").with_project_permissions(1, permissions);
        let token = JwtService::new(SECRET).create_token(&user, 3600).unwrap();
        format!("Bearer {token}")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_requires_authentication() {
        let response = app(store().await)
            .oneshot(Request::get("/work_packages/10").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_show_renders_locals() {
        let response = app(store().await)
            .oneshot(
                Request::get("/work_packages/10")
                    .header(header::AUTHORIZATION, token(&["view_work_packages"]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["template"], "work_packages/show");
        assert_eq!(body["view"], "show");
        assert_eq!(body["work_package"]["subject"], "Existing");
    }

    #[tokio::test]
    async fn test_show_with_bad_timestamp_is_unprocessable() {
        let response = app(store().await)
            .oneshot(
                Request::get("/work_packages/10?at=yesterday")
                    .header(header::AUTHORIZATION, token(&["view_work_packages"]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_show_unknown_work_package_is_not_found() {
        let response = app(store().await)
            .oneshot(
                Request::get("/work_packages/999")
                    .header(header::AUTHORIZATION, token(&["view_work_packages"]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_new_form_reads_nested_query() {
        let response = app(store().await)
            .oneshot(
                Request::get("/projects/ecookbook/work_packages/new?issue%5Bsubject%5D=Draft")
                    .header(header::AUTHORIZATION, token(&["add_work_packages"]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["template"], "work_packages/new");
        assert_eq!(body["work_package"]["subject"], "Draft");
        assert_eq!(body["work_package"]["typeId"], 1);
    }

    #[tokio::test]
    async fn test_new_type_renders_attributes_partial() {
        let response = app(store().await)
            .oneshot(
                Request::get("/projects/1/work_packages/new_type?work_package%5Bsubject%5D=Typed")
                    .header(header::AUTHORIZATION, token(&["add_work_packages"]))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["partial"], "attributes");
        assert_eq!(body["work_package"]["subject"], "Typed");
    }

    #[tokio::test]
    async fn test_create_redirects_to_new_work_package() {
        let store = store().await;
        let response = app(store.clone())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/projects/ecookbook/work_packages")
                    .header(header::AUTHORIZATION, token(&["add_work_packages"]))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"sti_type": "Issue", "work_package": {"subject": "Created", "type_id": 1}}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
            Some("/work_packages/11")
        );
        let body = json_body(response).await;
        assert_eq!(body["flash"]["notice"], "Successful creation.");

        let created = store.find_work_package(11).await.unwrap().unwrap();
        assert_eq!(created.subject, "Created");
        assert_eq!(created.author_id, Some(2));
    }

    #[tokio::test]
    async fn test_create_reads_query_parameters() {
        let store = store().await;
        let response = app(store.clone())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/projects/ecookbook/work_packages?sti_type=PlanningElement&send_notification=0")
                    .header(header::AUTHORIZATION, token(&["add_work_packages"]))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"work_package": {
                            "subject": "Phase",
                            "type_id": 1,
                            "start_date": "2013-05-01",
                            "due_date": "2013-05-31",
                        }})
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let created = store.find_work_package(11).await.unwrap().unwrap();
        assert_eq!(created.kind, WorkPackageKind::PlanningElement);
    }

    #[tokio::test]
    async fn test_create_body_sti_type_wins_over_query() {
        let store = store().await;
        let response = app(store.clone())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/projects/1/work_packages?sti_type=PlanningElement")
                    .header(header::AUTHORIZATION, token(&["add_work_packages"]))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"sti_type": "Issue", "work_package": {"subject": "Plain", "type_id": 1}}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let created = store.find_work_package(11).await.unwrap().unwrap();
        assert_eq!(created.kind, WorkPackageKind::Issue);
    }

    #[tokio::test]
    async fn test_create_without_subject_is_unprocessable() {
        let store = store().await;
        let response = app(store.clone())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/projects/1/work_packages")
                    .header(header::AUTHORIZATION, token(&["add_work_packages"]))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"work_package": {"type_id": 1}}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["template"], "work_packages/new");
        assert!(body["errors"]["errors"]["subject"].is_array());
        assert_eq!(store.work_package_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_unknown_sti_type_is_bad_request() {
        let response = app(store().await)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/projects/1/work_packages")
                    .header(header::AUTHORIZATION, token(&["add_work_packages"]))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"sti_type": "Task"}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_without_permission_is_forbidden() {
        let response = app(store().await)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/projects/1/work_packages")
                    .header(header::AUTHORIZATION, token(&["view_work_packages"]))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"work_package": {"subject": "x"}}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
