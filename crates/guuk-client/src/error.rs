//! Client error types and HTTP failure classification.

use std::path::PathBuf;

use thiserror::Error;

use guuk_core::ServiceError;

/// Errors raised by the client outside of a collaborator call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL could not be parsed.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    /// The entry has no stored media to download.
    #[error("entry has no stored media")]
    NoMedia,

    /// Writing a downloaded file failed.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Classify a transport-level reqwest failure.
pub(crate) fn transport(err: reqwest::Error, timeout_secs: u64) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Unreachable(format!("request timed out after {timeout_secs}s"))
    } else {
        ServiceError::Unreachable(err.to_string())
    }
}

/// Build a rejection from an error response body.
///
/// The service answers failures with `{"detail": "..."}`; validation failures
/// carry a list of `{"msg": ...}` objects instead.
pub(crate) fn rejection(status: u16, body: &str) -> ServiceError {
    ServiceError::Rejected {
        status,
        detail: extract_detail(body),
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("detail") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Array(items)) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                (!messages.is_empty()).then(|| messages.join("; "))
            }
            _ => None,
        },
        Err(_) => Some(body.to_string()),
    }
}
