//! Route configuration loading.
//!
//! Precedence (lowest to highest):
//! 1. `--config <path>` / `SANCTUM_CONFIG`, else `~/.config/sanctum/config.json` if present
//! 2. `SANCTUM_API_URL`

use anyhow::{Context, Result};
use sanctum_session::RouteConfig;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Directory name under config_dir for the default config.
pub const CONFIG_DIR: &str = "sanctum";

/// Filename for the default config.
pub const CONFIG_FILE: &str = "config.json";

/// Env var overriding `apiUrl`.
pub const API_URL_ENV: &str = "SANCTUM_API_URL";

/// Default config file path, `~/.config/sanctum/config.json` on Linux.
pub fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config dir")?;
    Ok(base.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load the route table.
///
/// An explicit path must exist. Without one, the default path is read when it
/// exists and skipped otherwise.
pub fn load(explicit: Option<&Path>) -> Result<RouteConfig> {
    let mut value = match explicit {
        Some(path) => read_json_object(path)?,
        None => match default_config_path().ok().filter(|p| p.exists()) {
            Some(path) => read_json_object(&path)?,
            None => Value::Object(Map::new()),
        },
    };

    if let (Some(url), Some(obj)) = (env_trimmed(API_URL_ENV), value.as_object_mut()) {
        obj.insert("apiUrl".into(), Value::String(url));
    }
    if value.get("apiUrl").is_none() {
        anyhow::bail!("No apiUrl configured; set {API_URL_ENV} or pass --config");
    }

    let config: RouteConfig =
        serde_json::from_value(value).context("Failed to deserialize route configuration")?;
    config.validate()?;
    tracing::debug!(api_url = config.api_url(), "route configuration loaded");
    Ok(config)
}

fn read_json_object(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let v: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    match v {
        Value::Object(_) => Ok(v),
        _ => anyhow::bail!("Config root must be a JSON object: {}", path.display()),
    }
}

/// Helper to read and normalize an env var (trim + filter empty).
fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
