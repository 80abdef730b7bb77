// OAuth service for Google authentication
// Decision: Manual OAuth2 implementation to avoid http crate version conflicts
// Decision: Every provider round-trip runs under an explicit timeout

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::config::GoogleOAuthConfig;

/// Upper bound on each round-trip to the provider. A hung provider call
/// must not pin a login request forever.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Verified identity returned by the provider
#[derive(Debug, Clone)]
pub struct OAuthUserInfo {
    /// Provider-stable subject identifier
    pub provider_id: String,
    /// User email
    pub email: String,
    /// User name
    pub name: String,
    /// Avatar URL
    pub avatar_url: Option<String>,
    /// Email verified status
    pub email_verified: bool,
}

/// Google OAuth service
pub struct GoogleOAuthService {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
}

impl GoogleOAuthService {
    pub fn new(config: &GoogleOAuthConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .context("Failed to build OAuth HTTP client")?;

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            http,
        })
    }

    /// Generate the authorization URL that starts the redirect flow.
    ///
    /// The requested claim set is fixed: stable subject id, profile name,
    /// and email.
    pub fn authorization_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "openid profile email"),
            ("state", state),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("https://accounts.google.com/o/oauth2/v2/auth?{}", query)
    }

    /// Exchange an authorization code for the verified user identity
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthUserInfo> {
        let token_response: GoogleTokenResponse = self
            .http
            .post("https://oauth2.googleapis.com/token")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("Failed to exchange code")?
            .json()
            .await
            .context("Failed to parse token response")?;

        let user_info: GoogleUserInfo = self
            .http
            .get("https://www.googleapis.com/oauth2/v3/userinfo")
            .bearer_auth(&token_response.access_token)
            .send()
            .await
            .context("Failed to fetch user info")?
            .json()
            .await
            .context("Failed to parse user info")?;

        Ok(OAuthUserInfo {
            provider_id: user_info.sub,
            email: user_info.email,
            name: user_info.name.unwrap_or_default(),
            avatar_url: user_info.picture,
            email_verified: user_info.email_verified.unwrap_or(false),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
    email_verified: Option<bool>,
}
