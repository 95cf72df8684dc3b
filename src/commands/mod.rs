//! CLI command definitions and dispatch.

pub mod licence;
pub mod migrate;
pub mod password;
pub mod token;

use clap::{Parser, Subcommand};

use tenantgate_core::config::AppConfig;
use tenantgate_core::error::AppError;
use tenantgate_database::DatabasePool;

/// Tenantgate: authentication and tenant-licence administration
#[derive(Debug, Parser)]
#[command(name = "tenantgate", version, about, long_about = None)]
pub struct Cli {
    /// Base configuration file (extension optional)
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply database migrations
    Migrate(migrate::MigrateArgs),
    /// Tenant licence management
    Licence(licence::LicenceArgs),
    /// Session token tools
    Token(token::TokenArgs),
    /// Password hashing tools
    Password(password::PasswordArgs),
}

impl Cli {
    /// Execute the selected command against a loaded configuration.
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config).await,
            Commands::Licence(args) => licence::execute(args, config).await,
            Commands::Token(args) => token::execute(args, config).await,
            Commands::Password(args) => password::execute(args),
        }
    }
}

/// Open the PostgreSQL pool described by the configuration.
pub async fn connect(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}
