//! Database migration commands.

use clap::Args;

use crate::output;
use tenantgate_core::config::AppConfig;
use tenantgate_core::error::AppError;
use tenantgate_database::migration::run_migrations;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {}

/// Apply every pending migration.
pub async fn execute(_args: &MigrateArgs, config: &AppConfig) -> Result<(), AppError> {
    let db = super::connect(config).await?;

    println!("Running database migrations...");
    let result = run_migrations(db.pool()).await;
    db.close().await;
    result?;

    output::print_success("All migrations applied.");
    Ok(())
}
