//! Remembered session between invocations.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use guuk_core::session::{Credential, Session};

#[derive(Debug, Serialize, Deserialize)]
pub struct StoredSession {
    pub username: String,
    pub credential: Credential,
    #[serde(default, with = "guuk_core::model::timestamp")]
    pub saved_at: Option<NaiveDateTime>,
}

pub fn save(path: &Path, session: &Session) -> Result<()> {
    let stored = StoredSession {
        username: session.username().to_string(),
        credential: session.credential().clone(),
        saved_at: Some(chrono::Local::now().naive_local()),
    };
    let json = serde_json::to_string_pretty(&stored).context("failed to serialize session")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("failed to open session file {}", path.display()))?;

    // `mode` only applies on creation; tighten a file left by an older run.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(json.as_bytes())
        .with_context(|| format!("failed to write session to {}", path.display()))?;
    Ok(())
}

pub fn load(path: &Path) -> Result<Option<StoredSession>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session from {}", path.display()))?;
    let stored = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse session file {}", path.display()))?;
    Ok(Some(stored))
}

/// Remove the session file. Returns whether one existed.
pub fn clear(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path)
        .with_context(|| format!("failed to remove session file {}", path.display()))?;
    Ok(true)
}
