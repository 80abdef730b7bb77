// Keymint API server
// Decision: Credential issuance only; resource routes live in other services
// Decision: Postgres when DATABASE_URL is set, in-memory dev store otherwise

mod api;
mod auth;
mod error;
mod storage;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{extract::State, routing::get, Json, Router};
use rand::Rng;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

use crate::error::AuthError;
use crate::storage::{CreateApiKeyRow, StorageBackend};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage: &'static str,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    storage: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage,
    })
}

/// Fallback for unmatched routes
async fn not_found() -> AuthError {
    AuthError::NotFound
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            api::common::ErrorResponse,
            api::common::DataResponse<auth::routes::CreatedUser>,
            api::common::DataResponse<auth::routes::UserInfoResponse>,
            auth::routes::RegisterRequest,
            auth::routes::LoginRequest,
            auth::routes::TokenResponse,
            auth::routes::CreatedUser,
            auth::routes::UserInfoResponse,
        )
    ),
    tags(
        (name = "auth", description = "Authentication and token issuance endpoints")
    ),
    info(
        title = "Keymint API",
        version = "0.1.0",
        description = "Credential issuance: password/Google authentication, API-key scope resolution, and signed token minting",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keymint_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("keymint-api starting...");

    // Load authentication configuration; a missing signing secret aborts here
    let auth_config = auth::AuthConfig::from_env()?;
    tracing::info!(
        dev_mode = auth_config.dev_mode,
        oauth = auth_config.oauth_enabled(),
        "Authentication configured"
    );

    // Select the credential store backend
    let store = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let store = StorageBackend::postgres(&database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");
            store
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
            let store = StorageBackend::in_memory();
            seed_dev_api_keys(&store).await?;
            store
        }
    };

    let health_state = HealthState {
        storage: if store.is_dev_mode() {
            "in-memory"
        } else {
            "postgres"
        },
    };

    let auth_state = auth::AuthState::new(auth_config, store);
    let app = build_app(auth_state, health_state);

    // Load CORS allowed origins from environment (optional)
    // Only needed when the UI is served from a different origin than the API
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();

    let app = if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
        app
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
        // The session cookie is SameSite=None, so credentialed cross-origin
        // requests must be allowed for the configured origins
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                ])
                .allow_credentials(true),
        )
    };

    let app = app.layer(TraceLayer::new_for_http());

    let port = std::env::var("PORT").unwrap_or_else(|_| "9000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Assemble the application router (extracted for testing)
fn build_app(auth_state: auth::AuthState, health_state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health).with_state(health_state))
        .route(
            "/api-doc/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(auth::routes(auth_state))
        .fallback(not_found)
}

/// Seed API keys for the in-memory dev store so login is usable out of the
/// box. Tokens are random per process and printed to the log.
async fn seed_dev_api_keys(store: &StorageBackend) -> Result<()> {
    let keys = [
        ("public", vec!["read".to_string()]),
        (
            "admin",
            vec![
                "read".to_string(),
                "write".to_string(),
                "delete".to_string(),
            ],
        ),
    ];

    for (name, scopes) in keys {
        let token = hex::encode(rand::thread_rng().gen::<[u8; 24]>());
        let key = store
            .create_api_key(CreateApiKeyRow {
                token,
                name: name.to_string(),
                scopes,
            })
            .await?;
        tracing::info!(name = %key.name, token = %key.token, scopes = ?key.scopes, "Seeded dev API key");
    }

    Ok(())
}
