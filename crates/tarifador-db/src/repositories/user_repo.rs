//! User repository implementation
//!
//! Provides PostgreSQL-backed storage for API users.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tarifador_core::{models::User, traits::UserStore, AppError, AppResult};
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of UserStore
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_SELECT_COLUMNS: &str = r#"
    id, username, password_hash, active, created_at
"#;

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self, user))]
    async fn save(&self, user: &User) -> AppResult<User> {
        debug!("Creating user: {}", user.username);

        let query = format!(
            r#"
            INSERT INTO users (id, username, password_hash, active, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, UserRow>(&query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.active)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating user: {}", e);
                if e.to_string().contains("unique constraint") {
                    AppError::UserAlreadyExists(user.username.clone())
                } else {
                    AppError::Database(format!("Failed to create user: {}", e))
                }
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        debug!("Finding user by username: {}", username);

        let query = format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_SELECT_COLUMNS
        );

        let result = sqlx::query_as::<sqlx::Postgres, UserRow>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding user by username: {}", e);
                AppError::Database(format!("Failed to find user: {}", e))
            })?;

        Ok(result.map(Into::into))
    }
}

/// Helper struct for mapping database rows to the domain model
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    active: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            active: row.active,
            created_at: row.created_at,
        }
    }
}
