//! Route configuration commands.

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use crate::loader;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective route configuration
    Show {
        /// Output as raw JSON (no formatting)
        #[arg(long)]
        json: bool,
    },

    /// Print the default config file location
    Path,
}

pub fn execute(cmd: ConfigCommands, explicit: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show { json } => {
            let config = loader::load(explicit)?;
            if json {
                println!("{}", serde_json::to_string(&config)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            Ok(())
        }
        ConfigCommands::Path => {
            let path = match explicit {
                Some(p) => p.to_path_buf(),
                None => loader::default_config_path()?,
            };
            let state = if path.exists() {
                "exists".green()
            } else {
                "missing".yellow()
            };
            println!("{} ({state})", path.display().to_string().cyan());
            Ok(())
        }
    }
}
