//! Password hashing commands.

use clap::{Args, Subcommand};

use tenantgate_auth::PasswordHasher;
use tenantgate_core::error::AppError;

/// Arguments for password commands
#[derive(Debug, Args)]
pub struct PasswordArgs {
    #[command(subcommand)]
    pub command: PasswordCommand,
}

/// Password subcommands
#[derive(Debug, Subcommand)]
pub enum PasswordCommand {
    /// Print the Argon2id PHC string for a password
    Hash {
        /// Plaintext password
        password: String,
    },
}

pub fn execute(args: &PasswordArgs) -> Result<(), AppError> {
    match &args.command {
        PasswordCommand::Hash { password } => {
            let hash = PasswordHasher::new().hash_password(password)?;
            println!("{hash}");
        }
    }
    Ok(())
}
