//! Client configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use guuk_core::provider::Provider;
use guuk_core::session::RolePolicy;

use crate::backend::DEFAULT_TIMEOUT_SECS;

/// Overrides `api_base_url` from any config file.
pub const API_URL_ENV: &str = "GUUK_API_URL";

/// Top-level guuk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuukConfig {
    /// Base URL of the guuk API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Users granted quiz authoring.
    #[serde(default)]
    pub admin_users: Vec<String>,
    /// Provider used when a generation does not name one.
    #[serde(default)]
    pub default_provider: Provider,
    /// Where the signed-in session is remembered between runs.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_session_file() -> PathBuf {
    dirs_path()
        .map(|d| d.join("session.json"))
        .unwrap_or_else(|| PathBuf::from(".guuk-session.json"))
}

impl Default for GuukConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout(),
            admin_users: Vec::new(),
            default_provider: Provider::default(),
            session_file: default_session_file(),
        }
    }
}

impl GuukConfig {
    pub fn role_policy(&self) -> RolePolicy {
        RolePolicy::new(self.admin_users.iter().cloned())
    }

    /// Render as TOML, for `guuk init`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `guuk.toml` in the current directory
/// 2. `~/.config/guuk/config.toml`
///
/// `GUUK_API_URL` overrides the base URL.
pub fn load_config() -> Result<GuukConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GuukConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("guuk.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loading config");
            toml::from_str::<GuukConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GuukConfig::default(),
    };

    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            config.api_base_url = url;
        }
    }

    config.api_base_url = resolve_env_vars(&config.api_base_url);
    config.admin_users = config
        .admin_users
        .iter()
        .map(|u| resolve_env_vars(u))
        .filter(|u| !u.trim().is_empty())
        .collect();
    config.session_file = PathBuf::from(resolve_env_vars(&config.session_file.to_string_lossy()));

    Ok(config)
}

/// `~/.config/guuk`, when `HOME` is set.
pub fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("guuk"))
}
