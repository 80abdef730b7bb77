// Authenticated-request extraction
// Decision: Accept the token from the Authorization header or the session
// cookie; either way expiry is re-validated on every request. A cookie that
// outlives its token proves nothing.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use uuid::Uuid;

use super::config::AuthConfig;
use super::jwt::JwtService;
use super::session::TOKEN_COOKIE;
use crate::error::AuthError;
use crate::storage::StorageBackend;

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub jwt_service: Arc<JwtService>,
    pub store: StorageBackend,
}

impl AuthState {
    pub fn new(config: AuthConfig, store: StorageBackend) -> Self {
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        Self {
            config,
            jwt_service,
            store,
        }
    }
}

/// Identity asserted by a verified, unexpired token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub scopes: Vec<String>,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .ok_or_else(|| AuthError::unauthorized("authentication required"))?;

        let claims = auth_state.jwt_service.validate(&token).map_err(|e| {
            tracing::debug!("token validation failed: {:#}", e);
            AuthError::unauthorized("invalid or expired token")
        })?;

        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::unauthorized("invalid or expired token"))?;

        Ok(AuthUser {
            id,
            name: claims.name,
            email: claims.email,
            scopes: claims.scopes,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

fn cookie_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(TOKEN_COOKIE).map(|c| c.value().to_string())
}
