//! Bearer token commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use sanctum_auth::{CredentialStore, SecureStore, TOKEN_KEY};

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Show whether a token is stored
    Show {
        /// Print the raw token value
        #[arg(long)]
        reveal: bool,
    },

    /// Remove the stored token
    Clear,
}

pub fn execute<S: SecureStore>(cmd: TokenCommands, store: S) -> Result<()> {
    let credentials = CredentialStore::open(store).context("Failed to open token store")?;

    match cmd {
        TokenCommands::Show { reveal } => {
            let Some(token) = credentials.get().context("Failed to read token")? else {
                anyhow::bail!("No token stored under '{TOKEN_KEY}'");
            };
            if reveal {
                println!("{}", token.expose());
            } else {
                println!(
                    "{} Token stored under '{}' ({} chars)",
                    "OK".green(),
                    TOKEN_KEY.cyan(),
                    token.expose().chars().count()
                );
            }
            Ok(())
        }
        TokenCommands::Clear => {
            credentials.clear().context("Failed to clear token")?;
            println!("{} Token cleared", "OK".green());
            Ok(())
        }
    }
}
