// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// The credential store is an external collaborator; this enum exposes the
// narrow contract the service needs: users by email, API keys by token, and
// record creation. Either PostgreSQL (production) or in-memory (dev mode).

use anyhow::Result;
use sqlx::PgPool;

use super::memory::InMemoryDatabase;
use super::models::*;
use super::repositories::Database;

/// Credential store that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(std::sync::Arc<InMemoryDatabase>),
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend from a database URL
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = Database::from_url(database_url).await?;
        db.migrate().await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(std::sync::Arc::new(InMemoryDatabase::new()))
    }

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory(_))
    }

    /// Get the PostgreSQL pool if using PostgreSQL backend
    #[allow(dead_code)]
    pub fn pool(&self) -> Option<&PgPool> {
        match self {
            Self::Postgres(db) => Some(db.pool()),
            Self::InMemory(_) => None,
        }
    }

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        match self {
            Self::Postgres(db) => db.create_user(input).await,
            Self::InMemory(db) => db.create_user(input).await,
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        match self {
            Self::Postgres(db) => db.get_user_by_email(email).await,
            Self::InMemory(db) => db.get_user_by_email(email).await,
        }
    }

    pub async fn create_api_key(&self, input: CreateApiKeyRow) -> Result<ApiKeyRow> {
        match self {
            Self::Postgres(db) => db.create_api_key(input).await,
            Self::InMemory(db) => db.create_api_key(input).await,
        }
    }

    pub async fn get_api_key_by_token(&self, token: &str) -> Result<Option<ApiKeyRow>> {
        match self {
            Self::Postgres(db) => db.get_api_key_by_token(token).await,
            Self::InMemory(db) => db.get_api_key_by_token(token).await,
        }
    }
}
