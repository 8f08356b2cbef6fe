//! Axum extractors for API handlers

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use op_auth::{extract_bearer_token, CurrentUser, JwtError, JwtService};
use op_services::work_packages::WorkPackageHandler;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub handler: WorkPackageHandler,
    pub jwt: Arc<JwtService>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(handler: WorkPackageHandler, jwt: JwtService, config: ApiConfig) -> Self {
        Self {
            handler,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub require_authentication: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            require_authentication: true,
        }
    }
}

/// Authenticated user extractor
///
/// Reads a Bearer JWT. Without a token the request runs as the anonymous
/// user unless authentication is required.
pub struct AuthenticatedUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match header.and_then(extract_bearer_token) {
            Some(token) => app_state
                .jwt
                .current_user(token)
                .map(AuthenticatedUser)
                .map_err(|err| match err {
                    JwtError::Expired => ApiError::unauthorized("Token is expired"),
                    other => {
                        tracing::debug!(error = %other, "rejected bearer token");
                        ApiError::unauthorized("Invalid token")
                    }
                }),
            None if app_state.config.require_authentication => {
                Err(ApiError::unauthorized("Authentication required"))
            }
            None => Ok(AuthenticatedUser(CurrentUser::anonymous())),
        }
    }
}

impl std::ops::Deref for AuthenticatedUser {
    type Target = CurrentUser;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Fold form-style query pairs into nested maps.
///
/// `issue[subject]=x` lands in `issue.subject`; `issue[watcher_user_ids][]=3`
/// appends to the `issue.watcher_user_ids` array. Plain keys stay at the top
/// level as strings.
pub fn nest_query_pairs(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut root = Map::new();

    for (key, value) in pairs {
        let Some((outer, rest)) = key.split_once('[') else {
            root.insert(key, Value::String(value));
            continue;
        };
        let Some((inner, tail)) = rest.split_once(']') else {
            root.insert(key, Value::String(value));
            continue;
        };

        let nested = root
            .entry(outer.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(nested) = nested else {
            continue;
        };

        if tail == "[]" {
            let slot = nested
                .entry(inner.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = slot {
                items.push(Value::String(value));
            }
        } else {
            nested.insert(inner.to_string(), Value::String(value));
        }
    }

    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_nests_bracketed_keys() {
        let nested = nest_query_pairs(pairs(&[
            ("type_id", "2"),
            ("issue[subject]", "Draft"),
            ("issue[watcher_user_ids][]", "3"),
            ("issue[watcher_user_ids][]", "4"),
        ]));

        assert_eq!(
            Value::Object(nested),
            json!({
                "type_id": "2",
                "issue": {"subject": "Draft", "watcher_user_ids": ["3", "4"]},
            })
        );
    }

    #[test]
    fn test_unbalanced_brackets_stay_flat() {
        let nested = nest_query_pairs(pairs(&[("issue[subject", "x")]));
        assert_eq!(nested.get("issue[subject"), Some(&json!("x")));
    }
}
