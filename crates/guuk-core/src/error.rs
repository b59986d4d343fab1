//! Error types for the quiz and generation core.
//!
//! `ServiceError` is what a collaborator call can fail with; `CoreError` is what
//! the core surfaces to its callers. Keeping both typed lets callers decide on
//! retries by matching variants instead of inspecting messages.

use thiserror::Error;

/// Message surfaced when a collaborator declines without giving a reason.
pub const GENERIC_FAILURE: &str = "the request could not be completed";

/// Failure of a single call to an external collaborator.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The collaborator could not be reached (connection refused, timeout, DNS).
    #[error("service unreachable: {0}")]
    Unreachable(String),

    /// The collaborator answered but declined the operation.
    #[error("rejected (HTTP {status}): {}", .detail.as_deref().unwrap_or(GENERIC_FAILURE))]
    Rejected { status: u16, detail: Option<String> },

    /// The collaborator answered with a body we could not decode.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ServiceError {
    /// Returns `true` if re-invoking the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Unreachable(_) => true,
            ServiceError::Rejected { status, .. } => *status >= 500,
            ServiceError::Malformed(_) => false,
        }
    }
}

/// Errors surfaced by the core components.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A local precondition was violated. Never sent to the network.
    #[error("validation error: {0}")]
    Validation(String),

    /// A collaborator could not be reached. The operation may be retried.
    #[error("{0}")]
    Transport(String),

    /// A collaborator responded but declined the operation.
    #[error("{0}")]
    Reported(String),

    /// The operation is not allowed in the component's current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    /// No session has been initialised.
    #[error("not signed in")]
    NotSignedIn,

    /// The session lacks the capability the operation requires.
    #[error("not permitted: {0}")]
    Forbidden(String),
}

impl CoreError {
    /// Returns `true` for local precondition failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }

    /// Map a service failure using custom messages for the unreachable case
    /// and for a rejection that carries no detail.
    pub fn from_service(
        err: ServiceError,
        unreachable_message: &str,
        declined_message: &str,
    ) -> Self {
        match err {
            ServiceError::Unreachable(cause) => {
                tracing::debug!("collaborator unreachable: {cause}");
                CoreError::Transport(unreachable_message.to_string())
            }
            ServiceError::Rejected { status, detail } => {
                let detail = detail.filter(|d| !d.trim().is_empty());
                tracing::debug!(status, "collaborator declined");
                CoreError::Reported(detail.unwrap_or_else(|| declined_message.to_string()))
            }
            other => other.into(),
        }
    }
}

impl From<ServiceError> for CoreError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unreachable(cause) => {
                CoreError::Transport(format!("could not reach service: {cause}"))
            }
            ServiceError::Rejected { detail, .. } => {
                CoreError::Reported(detail.unwrap_or_else(|| GENERIC_FAILURE.to_string()))
            }
            ServiceError::Malformed(msg) => CoreError::Reported(format!("unexpected response: {msg}")),
        }
    }
}
