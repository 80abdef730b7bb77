// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for all auth config
// Decision: The signing secret is required; a missing secret aborts startup

use anyhow::{Context, Result};
use std::time::Duration;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token lifetime (default 15 minutes)
    pub token_lifetime: Duration,
}

pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(15 * 60);

/// Google OAuth configuration
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Complete authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Development mode relaxes cookie flags (httpOnly/secure off)
    pub dev_mode: bool,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Google OAuth configuration, if the provider is set up
    pub google: Option<GoogleOAuthConfig>,
}

impl AuthConfig {
    /// Load configuration from environment variables.
    ///
    /// `AUTH_JWT_SECRET` is mandatory: returning an error here makes a
    /// missing secret startup-fatal rather than a per-request failure.
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("AUTH_JWT_SECRET")
            .context("AUTH_JWT_SECRET environment variable required")?;

        let token_lifetime = std::env::var("AUTH_TOKEN_LIFETIME_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        let dev_mode = std::env::var("DEV_MODE")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        let base_url = std::env::var("AUTH_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:9000".to_string());

        let google = match (
            std::env::var("AUTH_GOOGLE_CLIENT_ID"),
            std::env::var("AUTH_GOOGLE_CLIENT_SECRET"),
        ) {
            (Ok(client_id), Ok(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                let redirect_uri = std::env::var("AUTH_GOOGLE_REDIRECT_URI")
                    .unwrap_or_else(|_| format!("{}/v1/auth/google/callback", base_url));
                Some(GoogleOAuthConfig {
                    client_id,
                    client_secret,
                    redirect_uri,
                })
            }
            _ => None,
        };

        Ok(Self {
            dev_mode,
            jwt: JwtConfig {
                secret,
                token_lifetime,
            },
            google,
        })
    }

    /// Check if the external-identity strategy is available
    pub fn oauth_enabled(&self) -> bool {
        self.google.is_some()
    }
}
