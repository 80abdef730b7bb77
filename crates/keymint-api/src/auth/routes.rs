// Authentication HTTP routes
// Decision: /v1/auth/* prefix, consistent with other API routes
// Decision: Login is a sequential pipeline: strategy -> scope resolver ->
// token issuer -> session binder. The principal is threaded through as a
// value; handlers never stash identity on the request.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::api_key::ScopeResolver;
use super::middleware::{AuthState, AuthUser};
use super::oauth::GoogleOAuthService;
use super::session::{clear_session_cookie, session_cookie};
use super::strategy::{Authenticator, Credentials};
use crate::api::DataResponse;
use crate::api::validation::validate_register_input;
use crate::error::AuthError;
use crate::storage::{password::hash_password, CreateUserRow};

/// Generate a random state string for OAuth (32 hex characters)
fn generate_oauth_state() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

/// Register request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default, rename = "rememberMe")]
    pub remember_me: bool,
}

/// Login query parameters
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// API key token selecting the scopes granted to this session
    #[serde(rename = "API_KEY_TOKEN")]
    pub api_key_token: Option<String>,
}

/// Token response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Created-user payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedUser {
    pub id: String,
}

/// User info payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfoResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

/// OAuth callback query parameters
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    #[allow(dead_code)]
    pub state: Option<String>,
    /// Set by the provider when the user denies consent
    pub error: Option<String>,
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/logout", post(logout))
        .route("/v1/auth/google", get(google_redirect))
        .route("/v1/auth/google/callback", get(google_callback))
        .route("/v1/auth/me", get(me))
        .with_state(state)
}

/// POST /v1/auth/register - Create a new user account
///
/// No token is issued here; a separate login is required. The existence
/// check and the insert are two separate store calls, so concurrent
/// registrations for the same email can race; the database unique
/// constraint is the backstop.
pub async fn register(
    State(state): State<AuthState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<DataResponse<CreatedUser>>), AuthError> {
    validate_register_input(&req.email, &req.password, &req.name)?;

    let existing = state
        .store
        .get_user_by_email(&req.email)
        .await
        .map_err(AuthError::Internal)?;
    if existing.is_some() {
        return Err(AuthError::conflict("user already exists"));
    }

    let password_hash = hash_password(&req.password).map_err(AuthError::Internal)?;

    let user = state
        .store
        .create_user(CreateUserRow {
            email: req.email,
            name: req.name,
            avatar_url: None,
            password_hash: Some(password_hash),
            email_verified: false,
            auth_provider: Some("local".to_string()),
            auth_provider_id: None,
        })
        .await
        .map_err(AuthError::Internal)?;

    tracing::info!(user_id = %user.id, "user created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(
            CreatedUser {
                id: user.id.to_string(),
            },
            "user created",
        )),
    ))
}

/// POST /v1/auth/login - Authenticate and issue a scoped token
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>), AuthError> {
    // Strategy first: scope resolution never sees unauthenticated callers
    let principal = authenticator(&state)?
        .authenticate(Credentials::Password {
            email: req.email,
            password: req.password,
        })
        .await?;

    let api_key = ScopeResolver::new(state.store.clone())
        .resolve(query.api_key_token.as_deref())
        .await?;

    let token = state
        .jwt_service
        .issue(&principal, &api_key.scopes)
        .map_err(AuthError::Internal)?;

    tracing::info!(user_id = %principal.id, api_key = %api_key.name, "login succeeded");

    let jar = jar.add(session_cookie(
        token.clone(),
        req.remember_me,
        state.config.dev_mode,
    ));

    Ok((jar, Json(TokenResponse { token })))
}

/// POST /v1/auth/logout - Clear the session cookie
pub async fn logout(jar: CookieJar) -> CookieJar {
    jar.remove(clear_session_cookie())
}

/// GET /v1/auth/me - Identity asserted by the presented token
pub async fn me(user: AuthUser) -> Json<UserInfoResponse> {
    Json(UserInfoResponse {
        id: user.id.to_string(),
        name: user.name,
        email: user.email,
        scopes: user.scopes,
    })
}

/// GET /v1/auth/google - Redirect to the provider's consent screen
pub async fn google_redirect(State(state): State<AuthState>) -> Result<Redirect, AuthError> {
    let config = state
        .config
        .google
        .as_ref()
        .ok_or_else(|| AuthError::unauthorized("google login is not configured"))?;
    let service = GoogleOAuthService::new(config).map_err(AuthError::Internal)?;

    // TODO: verify state on the callback once there is a session store to hold it
    let oauth_state = generate_oauth_state();

    Ok(Redirect::to(&service.authorization_url(&oauth_state)))
}

/// GET /v1/auth/google/callback - Complete the provider round-trip
pub async fn google_callback(
    State(state): State<AuthState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<(StatusCode, Json<DataResponse<UserInfoResponse>>), AuthError> {
    if let Some(error) = &query.error {
        tracing::warn!(error = %error, "provider denied the authorization request");
        return Err(AuthError::Unauthenticated);
    }
    let code = query.code.ok_or(AuthError::Unauthenticated)?;

    let principal = authenticator(&state)?
        .authenticate(Credentials::GoogleCallback { code })
        .await?;

    tracing::info!(user_id = %principal.id, "login succeeded with google");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(
            UserInfoResponse {
                id: principal.id.to_string(),
                name: principal.name,
                email: principal.email,
                scopes: Vec::new(),
            },
            "login success with google",
        )),
    ))
}

/// Helper: build the strategy dispatcher from state
fn authenticator(state: &AuthState) -> Result<Authenticator, AuthError> {
    let google = state
        .config
        .google
        .as_ref()
        .map(GoogleOAuthService::new)
        .transpose()
        .map_err(AuthError::Internal)?;

    Ok(Authenticator::new(state.store.clone(), google))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::config::{AuthConfig, GoogleOAuthConfig, JwtConfig};
    use crate::auth::jwt::Claims;
    use crate::storage::{CreateApiKeyRow, StorageBackend};
    use axum::{
        body::Body,
        http::{header, Request, Response},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    const TEST_SECRET: &str = "test-secret-key-for-routing-tests";

    fn test_config() -> AuthConfig {
        AuthConfig {
            dev_mode: false,
            jwt: JwtConfig {
                secret: TEST_SECRET.to_string(),
                token_lifetime: Duration::from_secs(900),
            },
            google: None,
        }
    }

    async fn test_state() -> AuthState {
        let store = StorageBackend::in_memory();
        store
            .create_api_key(CreateApiKeyRow {
                token: "KEY1".to_string(),
                name: "public".to_string(),
                scopes: vec!["read".to_string()],
            })
            .await
            .unwrap();
        store
            .create_api_key(CreateApiKeyRow {
                token: "ADMIN".to_string(),
                name: "admin".to_string(),
                scopes: vec![
                    "read".to_string(),
                    "write".to_string(),
                    "delete".to_string(),
                ],
            })
            .await
            .unwrap();
        AuthState::new(test_config(), store)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register_user(state: &AuthState, email: &str, password: &str) {
        let response = routes(state.clone())
            .oneshot(post_json(
                "/v1/auth/register",
                json!({"email": email, "password": password, "name": "Ada"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_register_creates_user() {
        let state = test_state().await;

        let response = routes(state.clone())
            .oneshot(post_json(
                "/v1/auth/register",
                json!({"email": "a@x.com", "password": "password1", "name": "Ada"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert!(body["data"]["id"].is_string());
        assert_eq!(body["message"], "user created");

        let stored = state
            .store
            .get_user_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id.to_string(), body["data"]["id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let state = test_state().await;
        register_user(&state, "a@x.com", "password1").await;

        let first = state
            .store
            .get_user_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap();

        let response = routes(state.clone())
            .oneshot(post_json(
                "/v1/auth/register",
                json!({"email": "a@x.com", "password": "password2", "name": "Eve"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "user already exists");

        // The original record is untouched
        let stored = state
            .store
            .get_user_by_email("a@x.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.name, "Ada");
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_payload() {
        let state = test_state().await;

        let response = routes(state)
            .oneshot(post_json(
                "/v1/auth/register",
                json!({"email": "not-an-email", "password": "password1", "name": "Ada"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "invalid registration payload");
    }

    #[tokio::test]
    async fn test_login_issues_token_with_exact_key_scopes() {
        let state = test_state().await;
        register_user(&state, "a@x.com", "password1").await;

        let response = routes(state.clone())
            .oneshot(post_json(
                "/v1/auth/login?API_KEY_TOKEN=KEY1",
                json!({"email": "a@x.com", "password": "password1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(cookie.contains("SameSite=None"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));

        let body = body_json(response).await;
        let token = body["token"].as_str().unwrap();

        // The decoded scope set is exactly the API key's, no drift either way
        let claims = state.jwt_service.validate(token).unwrap();
        assert_eq!(claims.scopes, vec!["read".to_string()]);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[tokio::test]
    async fn test_login_admin_key_grants_admin_scopes() {
        let state = test_state().await;
        register_user(&state, "a@x.com", "password1").await;

        let response = routes(state.clone())
            .oneshot(post_json(
                "/v1/auth/login?API_KEY_TOKEN=ADMIN",
                json!({"email": "a@x.com", "password": "password1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let claims = state
            .jwt_service
            .validate(body["token"].as_str().unwrap())
            .unwrap();
        assert_eq!(
            claims.scopes,
            vec![
                "read".to_string(),
                "write".to_string(),
                "delete".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_login_remember_me_extends_cookie() {
        let state = test_state().await;
        register_user(&state, "a@x.com", "password1").await;

        let response = routes(state)
            .oneshot(post_json(
                "/v1/auth/login?API_KEY_TOKEN=KEY1",
                json!({"email": "a@x.com", "password": "password1", "rememberMe": true}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.contains("Max-Age=2592000"));
    }

    #[tokio::test]
    async fn test_login_without_api_key_token_fails() {
        let state = test_state().await;
        register_user(&state, "a@x.com", "password1").await;

        let response = routes(state)
            .oneshot(post_json(
                "/v1/auth/login",
                json!({"email": "a@x.com", "password": "password1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "API_KEY_TOKEN is required");
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn test_login_with_unknown_api_key_token_fails() {
        let state = test_state().await;
        register_user(&state, "a@x.com", "password1").await;

        let response = routes(state)
            .oneshot(post_json(
                "/v1/auth/login?API_KEY_TOKEN=BOGUS",
                json!({"email": "a@x.com", "password": "password1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_with_bad_credentials_fails_before_scope_resolution() {
        let state = test_state().await;
        register_user(&state, "a@x.com", "password1").await;

        // A perfectly valid API key does not rescue bad credentials
        let response = routes(state.clone())
            .oneshot(post_json(
                "/v1/auth/login?API_KEY_TOKEN=KEY1",
                json!({"email": "a@x.com", "password": "wrong"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "invalid credentials");

        // Bad credentials with a missing key still report the credential
        // failure: the strategy runs before the resolver
        let response = routes(state)
            .oneshot(post_json(
                "/v1/auth/login",
                json!({"email": "a@x.com", "password": "wrong"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "invalid credentials");
    }

    #[tokio::test]
    async fn test_me_accepts_bearer_token() {
        let state = test_state().await;
        register_user(&state, "a@x.com", "password1").await;

        let login = routes(state.clone())
            .oneshot(post_json(
                "/v1/auth/login?API_KEY_TOKEN=KEY1",
                json!({"email": "a@x.com", "password": "password1"}),
            ))
            .await
            .unwrap();
        let token = body_json(login).await["token"].as_str().unwrap().to_string();

        let response = routes(state)
            .oneshot(
                Request::builder()
                    .uri("/v1/auth/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["email"], "a@x.com");
        assert_eq!(body["scopes"], json!(["read"]));
    }

    #[tokio::test]
    async fn test_me_rejects_stale_cookie_with_expired_token() {
        let state = test_state().await;

        // A cookie can outlive its token by design; forge one holding a
        // token that expired two minutes ago
        let now = chrono::Utc::now().timestamp();
        let expired = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &Claims {
                sub: uuid::Uuid::nil().to_string(),
                name: "Ada".to_string(),
                email: "a@x.com".to_string(),
                scopes: vec!["read".to_string()],
                iat: now - 1020,
                exp: now - 120,
            },
            &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        let response = routes(state)
            .oneshot(
                Request::builder()
                    .uri("/v1/auth/me")
                    .header(header::COOKIE, format!("token={}", expired))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_without_credentials_fails() {
        let state = test_state().await;

        let response = routes(state)
            .oneshot(
                Request::builder()
                    .uri("/v1/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let state = test_state().await;

        let response = routes(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_google_redirect_unconfigured() {
        let state = test_state().await;

        let response = routes(state)
            .oneshot(
                Request::builder()
                    .uri("/v1/auth/google")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_google_redirect_points_at_provider() {
        let mut config = test_config();
        config.google = Some(GoogleOAuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:9000/v1/auth/google/callback".to_string(),
        });
        let state = AuthState::new(config, StorageBackend::in_memory());

        let response = routes(state)
            .oneshot(
                Request::builder()
                    .uri("/v1/auth/google")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(location.contains("client_id=client-123"));
    }

    #[tokio::test]
    async fn test_google_callback_denied_consent() {
        let mut config = test_config();
        config.google = Some(GoogleOAuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:9000/v1/auth/google/callback".to_string(),
        });
        let state = AuthState::new(config, StorageBackend::in_memory());

        let response = routes(state)
            .oneshot(
                Request::builder()
                    .uri("/v1/auth/google/callback?error=access_denied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "invalid credentials");
    }

    #[tokio::test]
    async fn test_google_callback_without_code() {
        let state = test_state().await;

        let response = routes(state)
            .oneshot(
                Request::builder()
                    .uri("/v1/auth/google/callback")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
