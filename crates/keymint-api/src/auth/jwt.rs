// JWT token issuance for authenticated sessions
// Decision: HS256 with a process-wide secret (symmetric key)
// Decision: Expiry is validated with zero leeway; a token is invalid the
// second it passes its lifetime

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::config::JwtConfig;
use super::strategy::Principal;

/// Claims carried by an issued token.
///
/// `scopes` is always exactly the scope set of the API key used at login;
/// the issuer never widens or narrows it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User display name
    pub name: String,
    /// User email
    pub email: String,
    /// Authorized scopes granted by the API key
    pub scopes: Vec<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Token issuer: signs a principal + scope set into a time-bound JWT
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a signed token asserting the principal's identity and scopes
    pub fn issue(&self, principal: &Principal, scopes: &[String]) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::from_std(self.config.token_lifetime)?;

        let claims = Claims {
            sub: principal.id.to_string(),
            name: principal.name.clone(),
            email: principal.email.clone(),
            scopes: scopes.to_vec(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).context("Failed to encode token")
    }

    /// Validate a token's signature and expiry and return its claims
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).context("Invalid token")?;

        Ok(token_data.claims)
    }
}
