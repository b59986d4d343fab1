//! Session identity and the context that hands it to every component.
//!
//! A `Session` is created once on successful sign-in and carries the user's
//! capabilities, resolved at construction from a [`RolePolicy`]. The
//! application root owns the [`SessionContext`] and lends the session to the
//! other components by reference.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::CoreError;
use crate::traits::AuthService;

/// Opaque bearer credential attached to every collaborator call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// What a session is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    TakeQuizzes,
    Generate,
    AuthorQuizzes,
}

/// Decides which capabilities a user gets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePolicy {
    /// Users granted quiz authoring.
    #[serde(default)]
    pub admin_users: Vec<String>,
}

impl RolePolicy {
    pub fn new(admin_users: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            admin_users: admin_users.into_iter().map(Into::into).collect(),
        }
    }

    pub fn capabilities_for(&self, username: &str) -> BTreeSet<Capability> {
        let mut caps = BTreeSet::from([Capability::TakeQuizzes, Capability::Generate]);
        if self.admin_users.iter().any(|admin| admin == username) {
            caps.insert(Capability::AuthorQuizzes);
        }
        caps
    }
}

/// An authenticated user.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
    credential: Credential,
    capabilities: BTreeSet<Capability>,
}

impl Session {
    pub fn new(username: impl Into<String>, credential: Credential, policy: &RolePolicy) -> Self {
        let username = username.into();
        let capabilities = policy.capabilities_for(&username);
        Self {
            username,
            credential,
            capabilities,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Fail with `Forbidden` unless the session holds `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), CoreError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "user '{}' lacks {capability:?}",
                self.username
            )))
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("credential", &self.credential)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Holds the current session, if any.
#[derive(Debug, Default)]
pub struct SessionContext {
    current: Option<Session>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a session, replacing any previous one.
    pub fn init(&mut self, session: Session) -> &Session {
        tracing::debug!(user = %session.username(), "session initialised");
        self.current.insert(session)
    }

    /// Drop the current session.
    pub fn clear(&mut self) -> Option<Session> {
        let previous = self.current.take();
        if let Some(session) = &previous {
            tracing::debug!(user = %session.username(), "session cleared");
        }
        previous
    }

    pub fn current(&self) -> Result<&Session, CoreError> {
        self.current.as_ref().ok_or(CoreError::NotSignedIn)
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    /// Exchange credentials with the authentication collaborator and install
    /// the resulting session.
    #[instrument(skip(self, auth, password, policy))]
    pub async fn sign_in(
        &mut self,
        auth: &dyn AuthService,
        username: &str,
        password: &str,
        policy: &RolePolicy,
    ) -> Result<&Session, CoreError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(CoreError::Validation(
                "username and password are required".into(),
            ));
        }

        let response = auth.login(username, password).await.map_err(|e| {
            tracing::warn!("sign-in failed: {e}");
            CoreError::from(e)
        })?;
        let session = Session::new(response.user, Credential::new(response.access_token), policy);
        Ok(self.init(session))
    }
}
