//! Tenant licence commands.

use std::sync::Arc;

use clap::{Args, Subcommand};

use crate::output;
use tenantgate_auth::LicenceLedger;
use tenantgate_core::config::AppConfig;
use tenantgate_core::error::AppError;
use tenantgate_core::types::{LicenceTypeId, TenantId};
use tenantgate_database::repositories::{LicenceTypeRepository, TenantLicenceRepository};

/// Arguments for licence commands
#[derive(Debug, Args)]
pub struct LicenceArgs {
    #[command(subcommand)]
    pub command: LicenceCommand,
}

/// Licence subcommands
#[derive(Debug, Subcommand)]
pub enum LicenceCommand {
    /// Show a tenant's licence, plan and seat usage
    Show {
        #[arg(long)]
        tenant_id: TenantId,
    },
    /// Set the expiry to the given number of days from now
    Renew {
        #[arg(long)]
        tenant_id: TenantId,
        #[arg(long)]
        days: u32,
    },
    /// Move a tenant to another licence type
    ChangeType {
        #[arg(long)]
        tenant_id: TenantId,
        #[arg(long)]
        licence_type_id: LicenceTypeId,
        /// Days until expiry; zero or less clears the expiry
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        days: i64,
    },
}

pub async fn execute(args: &LicenceArgs, config: &AppConfig) -> Result<(), AppError> {
    let db = super::connect(config).await?;
    let ledger = LicenceLedger::new(
        Arc::new(TenantLicenceRepository::new(db.pool().clone())),
        Arc::new(LicenceTypeRepository::new(db.pool().clone())),
        &config.auth,
        &config.licence,
    );

    let result = run(&ledger, &args.command).await;
    db.close().await;
    result
}

async fn run(ledger: &LicenceLedger, command: &LicenceCommand) -> Result<(), AppError> {
    match command {
        LicenceCommand::Show { tenant_id } => {
            let summary = ledger.summary(*tenant_id).await?;
            println!("Tenant licence:");
            output::print_kv("Licence key", &summary.licence_key);
            output::print_kv("Plan", &summary.licence_type_name);
            output::print_kv(
                "Seats",
                &format!("{}/{}", summary.used_seats, summary.max_seats),
            );
            output::print_kv(
                "Expires",
                &summary
                    .expiry_date
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string()),
            );
        }
        LicenceCommand::Renew { tenant_id, days } => {
            let licence = ledger.renew(*tenant_id, *days).await?;
            output::print_success(&format!("Licence for tenant {tenant_id} renewed"));
            output::print_json(&licence);
        }
        LicenceCommand::ChangeType {
            tenant_id,
            licence_type_id,
            days,
        } => {
            let licence = ledger
                .change_licence_type(*tenant_id, *licence_type_id, *days)
                .await?;
            output::print_success(&format!("Licence type for tenant {tenant_id} changed"));
            output::print_json(&licence);
        }
    }
    Ok(())
}
