// Authentication strategies
// Decision: Closed variant type over {password, external identity}; the route
// layer picks the variant, everything downstream is variant-agnostic
// Decision: Strategies produce a Principal and nothing else; token issuance
// happens later in the pipeline

use uuid::Uuid;

use super::oauth::GoogleOAuthService;
use crate::error::AuthError;
use crate::storage::{password::verify_password, CreateUserRow, StorageBackend, UserRow};

/// A verified identity, independent of any authorization scope.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&UserRow> for Principal {
    fn from(user: &UserRow) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Request credentials, one variant per strategy.
pub enum Credentials {
    /// Local email + password check
    Password { email: String, password: String },
    /// Authorization code handed back by Google's redirect
    GoogleCallback { code: String },
}

/// Dispatches a credential variant to its verification path.
pub struct Authenticator {
    store: StorageBackend,
    google: Option<GoogleOAuthService>,
}

impl Authenticator {
    pub fn new(store: StorageBackend, google: Option<GoogleOAuthService>) -> Self {
        Self { store, google }
    }

    /// Verify the supplied credentials and produce a Principal.
    ///
    /// Every failure path surfaces the same generic `Unauthenticated` error;
    /// callers cannot distinguish an unknown account from a bad secret.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<Principal, AuthError> {
        match credentials {
            Credentials::Password { email, password } => {
                self.verify_local(&email, &password).await
            }
            Credentials::GoogleCallback { code } => self.verify_google(&code).await,
        }
    }

    async fn verify_local(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await
            .map_err(AuthError::Internal)?
            .ok_or(AuthError::Unauthenticated)?;

        let password_hash = user.password_hash.as_ref().ok_or(AuthError::Unauthenticated)?;

        let valid = verify_password(password, password_hash).map_err(AuthError::Internal)?;
        if !valid {
            return Err(AuthError::Unauthenticated);
        }

        Ok(Principal::from(&user))
    }

    async fn verify_google(&self, code: &str) -> Result<Principal, AuthError> {
        let google = self.google.as_ref().ok_or_else(|| {
            tracing::warn!("Google callback received but OAuth is not configured");
            AuthError::Unauthenticated
        })?;

        let info = google.exchange_code(code).await.map_err(|e| {
            tracing::warn!("OAuth code exchange failed: {:#}", e);
            AuthError::Unauthenticated
        })?;

        // Find-or-provision: first login through the provider creates the
        // local record, without a password hash.
        let user = self
            .store
            .get_user_by_email(&info.email)
            .await
            .map_err(AuthError::Internal)?;

        let user = match user {
            Some(user) => user,
            None => self
                .store
                .create_user(CreateUserRow {
                    email: info.email.clone(),
                    name: info.name.clone(),
                    avatar_url: info.avatar_url.clone(),
                    password_hash: None,
                    email_verified: info.email_verified,
                    auth_provider: Some("google".to_string()),
                    auth_provider_id: Some(info.provider_id.clone()),
                })
                .await
                .map_err(AuthError::Internal)?,
        };

        Ok(Principal::from(&user))
    }
}
