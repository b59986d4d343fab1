//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use guuk_client::config::{load_config_from, GuukConfig};
use guuk_client::HttpBackend;
use guuk_core::session::{Session, SessionContext};

use crate::session_store;

pub mod auth;
pub mod author;
pub mod generate;
pub mod history;
pub mod init;
pub mod models;
pub mod quizzes;

/// Everything a networked command needs: config, backend and the restored
/// session, if one was remembered.
pub struct App {
    pub config: GuukConfig,
    pub backend: Arc<HttpBackend>,
    pub context: SessionContext,
}

impl App {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config_from(config_path)?;
        let backend = Arc::new(HttpBackend::from_config(&config)?);

        let mut context = SessionContext::new();
        if let Some(stored) = session_store::load(&config.session_file)? {
            let policy = config.role_policy();
            context.init(Session::new(stored.username, stored.credential, &policy));
        }

        tracing::debug!(api = %backend.base_url(), signed_in = context.is_signed_in(), "app loaded");
        Ok(Self {
            config,
            backend,
            context,
        })
    }

    pub fn session(&self) -> Result<&Session> {
        self.context
            .current()
            .map_err(|e| anyhow!("{e}; run `guuk login <username>` first"))
    }
}

/// Password from the flag, else `GUUK_PASSWORD`.
pub fn resolve_password(flag: Option<String>) -> Result<String> {
    flag.or_else(|| std::env::var("GUUK_PASSWORD").ok())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| anyhow!("password required (use --password or GUUK_PASSWORD)"))
}

/// Shorten `text` to at most `max` characters for table cells.
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim().replace('\n', " ");
    if text.chars().count() <= max {
        text
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
