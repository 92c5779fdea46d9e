//! Invitation repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;
use tollgate_core::types::OrganizationId;
use tollgate_entity::InvitationToken;

use super::InvitationStore;
use super::user::is_unique_violation;

const COLUMNS: &str = "token, organization_id, receiver_email, capabilities, accepted, \
                       created_at, token_expiration_time, remove_from_db_date";

/// PostgreSQL-backed [`InvitationStore`].
#[derive(Debug, Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    /// Create a new invitation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvitationStore for InvitationRepository {
    async fn get_invitations_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<InvitationToken>> {
        sqlx::query_as::<_, InvitationToken>(&format!(
            "SELECT {COLUMNS} FROM invitations WHERE organization_id = $1 ORDER BY created_at"
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list invitations", e))
    }

    async fn get_invitation_by_token(&self, token: &str) -> AppResult<Option<InvitationToken>> {
        sqlx::query_as::<_, InvitationToken>(&format!(
            "SELECT {COLUMNS} FROM invitations WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find invitation", e))
    }

    async fn insert_invitation(&self, invitation: &InvitationToken) -> AppResult<()> {
        sqlx::query(&format!(
            "INSERT INTO invitations ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(&invitation.token)
        .bind(invitation.organization_id)
        .bind(&invitation.receiver_email)
        .bind(Json(&invitation.capabilities))
        .bind(invitation.accepted)
        .bind(invitation.created_at)
        .bind(invitation.token_expiration_time)
        .bind(invitation.remove_from_db_date)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("Invitation token already exists")
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to insert invitation", e)
            }
        })?;
        Ok(())
    }

    async fn replace_invitation(&self, invitation: &InvitationToken) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE invitations SET organization_id = $2, receiver_email = $3, capabilities = $4, \
             accepted = $5, token_expiration_time = $6, remove_from_db_date = $7 \
             WHERE token = $1",
        )
        .bind(&invitation.token)
        .bind(invitation.organization_id)
        .bind(&invitation.receiver_email)
        .bind(Json(&invitation.capabilities))
        .bind(invitation.accepted)
        .bind(invitation.token_expiration_time)
        .bind(invitation.remove_from_db_date)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to replace invitation", e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn try_accept_invitation(&self, token: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE invitations SET accepted = TRUE WHERE token = $1 AND accepted = FALSE",
        )
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to accept invitation", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_invitation_by_token(&self, token: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM invitations WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete invitation", e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
