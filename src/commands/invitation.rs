//! Invitation maintenance command.

use std::sync::Arc;

use clap::Args;
use uuid::Uuid;

use tollgate_auth::InvitationTokenManager;
use tollgate_core::RetryPolicy;
use tollgate_core::config::AppConfig;
use tollgate_core::error::AppError;
use tollgate_core::traits::SystemClock;
use tollgate_core::types::OrganizationId;
use tollgate_database::{InvitationRepository, OrganizationRepository};

use super::OutputFormat;

/// Arguments for `purge-invitations`
#[derive(Debug, Args)]
pub struct PurgeArgs {
    /// Organization whose stale invitations are deleted
    #[arg(long)]
    pub org: Uuid,
}

/// Purge stale invitations of one organization.
pub async fn execute(
    args: &PurgeArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::connect(config).await?;
    let manager = InvitationTokenManager::new(
        Arc::new(InvitationRepository::new(pool.pool().clone())),
        Arc::new(OrganizationRepository::new(pool.pool().clone())),
        tollgate_notify::build_notifier(&config.notification)?,
        Arc::new(SystemClock),
        config.invitation.clone(),
        RetryPolicy::from(&config.retry),
    );

    let organization_id = OrganizationId::from_uuid(args.org);
    let deleted = manager.purge(organization_id).await;
    pool.close().await;
    let deleted = deleted?;

    match format {
        OutputFormat::Text => println!("Deleted {deleted} stale invitation(s)."),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "organization_id": organization_id, "deleted": deleted })
        ),
    }
    Ok(())
}
