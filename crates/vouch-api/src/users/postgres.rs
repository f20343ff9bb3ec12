//! Postgres user directory.
//!
//! All queries run against the `users` table created by the embedded
//! migrations. Uniqueness of username and email is enforced by the schema;
//! a unique-constraint violation on insert maps to
//! [`DirectoryError::Duplicate`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;
use vouch_token::HealthCheck;

use super::{DirectoryError, User, UserDirectory};
use crate::config::AppMode;

/// Open a connection pool and, outside production, apply migrations.
pub async fn init_pool(url: &str, mode: AppMode) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    if mode.runs_migrations() {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    } else {
        tracing::info!("Production mode: skipping migrations");
    }

    Ok(pool)
}

/// User directory backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Wrap a pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            created_at: self.created_at,
        }
    }
}

fn backend(err: sqlx::Error) -> DirectoryError {
    DirectoryError::Backend(err.to_string())
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Uuid, DirectoryError> {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if let sqlx::Error::Database(db) = &err {
                if db.is_unique_violation() {
                    return DirectoryError::Duplicate;
                }
            }
            backend(err)
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(UserRow::into_user))
    }
}

#[async_trait]
impl HealthCheck for PgUserDirectory {
    fn component(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<(), String> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
