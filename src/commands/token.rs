//! Session token commands.

use std::sync::Arc;

use clap::{Args, Subcommand};

use crate::output;
use tenantgate_auth::{AuthError, Identity, JwtDecoder, JwtEncoder};
use tenantgate_core::config::AppConfig;
use tenantgate_core::error::AppError;
use tenantgate_database::UserStore;
use tenantgate_database::repositories::UserRepository;

/// Arguments for token commands
#[derive(Debug, Args)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands
#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Issue a session token for an existing user, skipping the password check
    Issue {
        /// User email
        #[arg(long)]
        email: String,
    },
    /// Verify a token and print its claims
    Decode {
        /// Compact token text
        token: String,
    },
}

pub async fn execute(args: &TokenArgs, config: &AppConfig) -> Result<(), AppError> {
    match &args.command {
        TokenCommand::Issue { email } => {
            let db = super::connect(config).await?;
            let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(db.pool().clone()));
            let user = users.find_by_email(email).await?;
            db.close().await;

            let user = user.ok_or_else(|| AppError::not_found(format!("No user with email '{email}'")))?;
            if !user.is_active {
                return Err(AuthError::AccountInactive.into());
            }

            let issued = JwtEncoder::new(&config.auth)?.issue(&Identity::from(&user))?;
            println!("{}", issued.token);
            output::print_json(&issued.claims);
        }
        TokenCommand::Decode { token } => {
            let claims = JwtDecoder::new(&config.auth)?.decode(token)?;
            output::print_json(&claims);
        }
    }
    Ok(())
}
