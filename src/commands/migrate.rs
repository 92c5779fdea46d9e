//! Database migration command.

use tracing::info;

use tollgate_core::config::AppConfig;
use tollgate_core::error::AppError;

/// Apply every pending migration.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let pool = super::connect(config).await?;
    pool.migrate().await?;
    info!("Database migrations complete");
    println!("All migrations applied successfully.");
    pool.close().await;
    Ok(())
}
