//! Session commands.
//!
//! Each command builds a [`SessionManager`] over the selected token store,
//! runs one action and prints the resulting session as JSON on stdout.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use sanctum_auth::SecureStore;
use sanctum_session::{AuthenticationStatus, CredentialOutcome, RouteConfig, Session, SessionManager};
use serde_json::{Map, Value};

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Ask the backend who is signed in
    Check,

    /// Sign in with credentials and confirm the session
    SignIn {
        #[command(flatten)]
        payload: PayloadArgs,

        /// Only establish the credential; skip the user fetch
        #[arg(long)]
        no_confirm: bool,
    },

    /// Register an account and confirm the session
    SignUp {
        #[command(flatten)]
        payload: PayloadArgs,

        /// Only establish the credential; skip the user fetch
        #[arg(long)]
        no_confirm: bool,
    },

    /// End the session on the backend
    SignOut,

    /// Request a password reset link
    ForgotPassword {
        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// Complete a password reset
    ResetPassword {
        #[command(flatten)]
        payload: PayloadArgs,
    },
}

/// Request body, given as fields or as raw JSON
#[derive(Args)]
pub struct PayloadArgs {
    /// Payload field (repeatable)
    #[arg(short = 'f', long = "field", value_name = "KEY=VALUE", conflicts_with = "data")]
    fields: Vec<String>,

    /// Payload as a JSON object
    #[arg(long, value_name = "JSON")]
    data: Option<String>,
}

impl PayloadArgs {
    fn into_value(self) -> Result<Value> {
        if let Some(raw) = self.data {
            let value: Value = serde_json::from_str(&raw).context("Invalid JSON in --data")?;
            if !value.is_object() {
                anyhow::bail!("--data must be a JSON object");
            }
            return Ok(value);
        }

        let mut map = Map::new();
        for field in self.fields {
            let (key, value) = field
                .split_once('=')
                .with_context(|| format!("Field '{field}' is not KEY=VALUE"))?;
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("Field '{field}' has an empty key");
            }
            map.insert(key.to_string(), Value::String(value.to_string()));
        }
        if map.is_empty() {
            anyhow::bail!("No payload given; use -f KEY=VALUE or --data JSON");
        }
        Ok(Value::Object(map))
    }
}

pub async fn execute<S: SecureStore>(
    cmd: SessionCommands,
    config: RouteConfig,
    store: S,
) -> Result<()> {
    let manager = SessionManager::new(config, store).context("Failed to set up session")?;

    match cmd {
        SessionCommands::Check => cmd_check(&manager).await,
        SessionCommands::SignIn {
            payload,
            no_confirm,
        } => {
            let payload = payload.into_value()?;
            let outcome = manager.sign_in(&payload).await.context("Sign-in failed")?;
            finish_credential(&manager, outcome, no_confirm).await
        }
        SessionCommands::SignUp {
            payload,
            no_confirm,
        } => {
            let payload = payload.into_value()?;
            let outcome = manager.sign_up(&payload).await.context("Sign-up failed")?;
            finish_credential(&manager, outcome, no_confirm).await
        }
        SessionCommands::SignOut => cmd_sign_out(&manager).await,
        SessionCommands::ForgotPassword { payload } => {
            let payload = payload.into_value()?;
            let ok = manager
                .forgot_password(&payload)
                .await
                .context("Password reset request failed")?;
            report_submission(ok, "Password reset link requested")
        }
        SessionCommands::ResetPassword { payload } => {
            let payload = payload.into_value()?;
            let ok = manager
                .reset_password(&payload)
                .await
                .context("Password reset failed")?;
            report_submission(ok, "Password reset")
        }
    }
}

async fn cmd_check<S: SecureStore>(manager: &SessionManager<S>) -> Result<()> {
    manager
        .check_authentication()
        .await
        .context("Authentication check failed")?;
    print_session(&manager.session())
}

async fn finish_credential<S: SecureStore>(
    manager: &SessionManager<S>,
    outcome: CredentialOutcome,
    no_confirm: bool,
) -> Result<()> {
    match outcome {
        CredentialOutcome::Established => {
            eprintln!("{} Credential established", "OK".green());
            if !no_confirm {
                manager
                    .confirm_session()
                    .await
                    .context("Session confirmation failed")?;
            }
            print_session(&manager.session())
        }
        CredentialOutcome::Rejected => {
            print_session(&manager.session())?;
            anyhow::bail!("Credentials were rejected");
        }
    }
}

async fn cmd_sign_out<S: SecureStore>(manager: &SessionManager<S>) -> Result<()> {
    let signed_out = manager.sign_out().await.context("Sign-out failed")?;
    if !signed_out {
        eprintln!("{} Backend reports no active session", "WARN".yellow());
    }
    print_session(&manager.session())
}

fn report_submission(ok: bool, what: &str) -> Result<()> {
    if !ok {
        anyhow::bail!("{what}: backend answered 401 Unauthorized");
    }
    println!("{} {what}", "OK".green());
    Ok(())
}

fn print_session(session: &Session) -> Result<()> {
    let label = match session.status() {
        AuthenticationStatus::Authenticated => "AUTHENTICATED".green(),
        AuthenticationStatus::Unauthenticated => "UNAUTHENTICATED".yellow(),
        AuthenticationStatus::Unknown => "UNKNOWN".dimmed(),
    };
    eprintln!("{label}");
    println!("{}", serde_json::to_string_pretty(session)?);
    Ok(())
}
