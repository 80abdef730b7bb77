// API key scope resolution
// Decision: The resolver reads, never writes; scope grants live entirely in
// the credential store

use crate::error::AuthError;
use crate::storage::{ApiKeyRow, StorageBackend};

/// Maps a caller-supplied API key token to its authorized scope set.
///
/// A missing token and an unknown token both surface as 401; only the
/// message differs, never the status.
#[derive(Clone)]
pub struct ScopeResolver {
    store: StorageBackend,
}

impl ScopeResolver {
    pub fn new(store: StorageBackend) -> Self {
        Self { store }
    }

    /// Resolve an API key token to its key record.
    ///
    /// The returned scopes are exactly the key's stored scopes; callers must
    /// not widen them.
    pub async fn resolve(&self, token: Option<&str>) -> Result<ApiKeyRow, AuthError> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AuthError::unauthorized("API_KEY_TOKEN is required")),
        };

        let api_key = self
            .store
            .get_api_key_by_token(token)
            .await
            .map_err(AuthError::Internal)?
            .ok_or_else(|| AuthError::unauthorized("unauthorized"))?;

        Ok(api_key)
    }
}
