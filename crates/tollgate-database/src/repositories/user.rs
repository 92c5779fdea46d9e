//! User repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;
use tollgate_core::types::UserId;
use tollgate_entity::User;

use super::UserStore;

/// PostgreSQL-backed [`UserStore`]; users live in `users.document`.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Attach the authoritative column version to a loaded document.
fn hydrate(row: Option<(Json<User>, i64)>) -> Option<User> {
    row.map(|(Json(mut user), version)| {
        user.version = version;
        user
    })
}

fn load_error(e: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::Database, "Failed to load user", e)
}

#[async_trait]
impl UserStore for UserRepository {
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, (Json<User>, i64)>(
            "SELECT document, version FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(load_error)?;
        Ok(hydrate(row))
    }

    async fn get_user_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, (Json<User>, i64)>(
            "SELECT document, version FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(load_error)?;
        Ok(hydrate(row))
    }

    async fn get_user_by_refresh_token(&self, token: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, (Json<User>, i64)>(
            "SELECT document, version FROM users \
             WHERE document -> 'refresh_tokens' @> jsonb_build_array(jsonb_build_object('token', $1::text))",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(load_error)?;
        Ok(hydrate(row))
    }

    async fn replace_user(&self, user: &mut User) -> AppResult<()> {
        let expected = user.version;
        let new_version: Option<i64> = sqlx::query_scalar(
            "INSERT INTO users (id, email, document, version) VALUES ($1, $2, $3, $4 + 1) \
             ON CONFLICT (id) DO UPDATE \
             SET email = EXCLUDED.email, document = EXCLUDED.document, \
                 version = users.version + 1, updated_at = NOW() \
             WHERE users.version = $4 \
             RETURNING version",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(Json(&*user))
        .bind(expected)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to replace user", e))?;

        match new_version {
            Some(version) => {
                user.version = version;
                Ok(())
            }
            None => Err(AppError::conflict(format!(
                "User {} was modified concurrently (expected version {expected})",
                user.id
            ))),
        }
    }

    async fn insert_user(&self, user: &mut User) -> AppResult<()> {
        let version: i64 = sqlx::query_scalar(
            "INSERT INTO users (id, email, document, version) VALUES ($1, $2, $3, 1) \
             RETURNING version",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(Json(&*user))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!("A user with email '{}' already exists", user.email))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to insert user", e)
            }
        })?;

        user.version = version;
        Ok(())
    }
}

/// Whether `e` is a PostgreSQL unique-constraint violation.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}
