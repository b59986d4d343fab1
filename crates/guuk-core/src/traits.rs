//! Collaborator traits.
//!
//! The core never performs I/O itself. Authentication, quiz storage, content
//! generation and history storage are reached through these async traits,
//! implemented over HTTP by `guuk-client` and in memory by its mock backend.
//! Every call except sign-in carries the session credential.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::model::{
    CreateQuizResponse, GenerationEnvelope, GenerationRequest, HistoryEntry, NewQuiz, Quiz,
    QuizScore, QuizSubmission, QuizSummary,
};
use crate::session::Credential;

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Exchanges user credentials for a session credential.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ServiceError>;

    async fn register(&self, request: &RegisterRequest) -> Result<(), ServiceError>;
}

/// Successful sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// New account details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// ---------------------------------------------------------------------------
// Quiz storage
// ---------------------------------------------------------------------------

#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn list(&self, credential: &Credential) -> Result<Vec<QuizSummary>, ServiceError>;

    async fn get(&self, credential: &Credential, quiz_id: &str) -> Result<Quiz, ServiceError>;

    async fn create(
        &self,
        credential: &Credential,
        quiz: &NewQuiz,
    ) -> Result<CreateQuizResponse, ServiceError>;

    async fn submit(
        &self,
        credential: &Credential,
        submission: &QuizSubmission,
    ) -> Result<QuizScore, ServiceError>;
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// The five generation capabilities. Each takes the same request shape and
/// returns an envelope that may or may not carry an entry.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate_text(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError>;

    async fn generate_image(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError>;

    async fn generate_video(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError>;

    async fn generate_animation(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError>;

    async fn generate_voiceover(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError>;
}

// ---------------------------------------------------------------------------
// History storage
// ---------------------------------------------------------------------------

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persisted history for a user, newest first.
    async fn history(
        &self,
        credential: &Credential,
        user: &str,
    ) -> Result<Vec<HistoryEntry>, ServiceError>;
}
