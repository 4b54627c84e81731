//! Sanctum session CLI.
//!
//! The `sanctum` command signs in to a Sanctum-style backend, keeps the
//! issued bearer token in a local store, and reports the resulting session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sanctum_auth::{KeyringStore, MemoryStore, SecureStore, XdgFileStore};

mod commands;
mod loader;
#[cfg(test)]
mod test_support;

/// Service and directory name used by the token stores
const APP_NAME: &str = "sanctum";

#[derive(Parser)]
#[command(name = "sanctum")]
#[command(about = "Sign in to and inspect sessions on a Sanctum-style backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Route configuration file (JSON)
    #[arg(long, env = "SANCTUM_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Where the bearer token is kept
    #[arg(long, value_enum, default_value_t = StoreKind::File, global = true)]
    store: StoreKind,

    /// Directory for the encrypted token file (file store only)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StoreKind {
    /// System keychain
    Keyring,
    /// Encrypted file under the data directory
    File,
    /// Process memory; forgotten on exit
    Memory,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Session(commands::session::SessionCommands),

    /// Inspect or remove the stored bearer token
    Token {
        #[command(subcommand)]
        command: commands::token::TokenCommands,
    },

    /// Route configuration commands
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    let config_path = cli.config.as_deref();
    let command = match cli.command {
        Commands::Config { command } => return commands::config::execute(command, config_path),
        other => other,
    };

    match cli.store {
        StoreKind::Keyring => dispatch(command, config_path, KeyringStore::new(APP_NAME)).await,
        StoreKind::File => {
            let store = match cli.data_dir {
                Some(dir) => XdgFileStore::with_base_path(dir),
                None => XdgFileStore::new(APP_NAME),
            }
            .context("Failed to open token file store")?;
            dispatch(command, config_path, store).await
        }
        StoreKind::Memory => dispatch(command, config_path, MemoryStore::new()).await,
    }
}

async fn dispatch<S: SecureStore>(
    command: Commands,
    config_path: Option<&Path>,
    store: S,
) -> Result<()> {
    match command {
        Commands::Session(command) => {
            let config = loader::load(config_path)?;
            commands::session::execute(command, config, store).await
        }
        Commands::Token { command } => commands::token::execute(command, store),
        Commands::Config { command } => commands::config::execute(command, config_path),
    }
}
