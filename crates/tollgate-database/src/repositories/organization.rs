//! Organization repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;
use tollgate_core::types::OrganizationId;
use tollgate_entity::Organization;

use super::OrganizationStore;

/// PostgreSQL-backed [`OrganizationStore`].
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    /// Create a new organization repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationStore for OrganizationRepository {
    async fn get_organization_by_id(&self, id: OrganizationId) -> AppResult<Option<Organization>> {
        let row = sqlx::query_scalar::<_, Json<Organization>>(
            "SELECT document FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find organization", e))?;

        Ok(row.map(|Json(org)| org))
    }

    async fn organization_exists(&self, id: OrganizationId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM organizations WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    "Failed to check organization existence",
                    e,
                )
            })
    }

    async fn insert_organization(&self, organization: &Organization) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO organizations (id, owner_id, name, document, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(organization.id)
        .bind(organization.owner_id)
        .bind(&organization.name)
        .bind(Json(organization))
        .bind(organization.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to insert organization", e)
        })?;
        Ok(())
    }
}
