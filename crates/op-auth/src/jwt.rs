//! JWT Authentication
//!
//! Tokens carry the user's admin flag and project permissions, so a request
//! can be authorized without a membership lookup.

use std::collections::HashMap;

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use op_core::traits::Id;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::permissions::CurrentUser;

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// JWT ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default)]
    pub admin: bool,
    /// Permission names per project id
    #[serde(default)]
    pub projects: HashMap<Id, Vec<String>>,
}

/// JWT errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Token is expired")]
    Expired,
    #[error("Invalid token: {0}")]
    Invalid(String),
    #[error("Missing token")]
    Missing,
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),
}

/// JWT service for creating and validating tokens
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token for `user`, valid for `expires_in_seconds`
    pub fn create_token(&self, user: &CurrentUser, expires_in_seconds: i64) -> Result<String, JwtError> {
        let now = Utc::now().timestamp();
        let exp = usize::try_from(now + expires_in_seconds)
            .map_err(|_| JwtError::EncodingFailed("expiry out of range".to_string()))?;
        let iat = usize::try_from(now)
            .map_err(|_| JwtError::EncodingFailed("clock before epoch".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            exp,
            iat,
            jti: Some(uuid::Uuid::new_v4().to_string()),
            login: Some(user.login.clone()),
            admin: user.is_admin,
            projects: user.project_permissions(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// Rebuild the acting user from a token
    pub fn current_user(&self, token: &str) -> Result<CurrentUser, JwtError> {
        let claims = self.validate_token(token)?;
        let id: Id = claims
            .sub
            .parse()
            .map_err(|_| JwtError::Invalid("Invalid user ID in token".to_string()))?;

        let mut user = CurrentUser::new(id, claims.login.unwrap_or_default());
        user.is_admin = claims.admin;
        for (project_id, permissions) in claims.projects {
            for permission in permissions {
                user.add_project_permission(project_id, permission);
            }
        }

        tracing::debug!(user_id = id, admin = user.is_admin, "authenticated bearer token");
        Ok(user)
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(authorization: &str) -> Option<&str> {
    let (scheme, token) = authorization.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}
