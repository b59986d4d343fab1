//! In-memory backend for tests and offline demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

use guuk_core::model::{
    ContentType, CreateQuizResponse, GenerationEnvelope, GenerationRequest, HistoryEntry, NewQuiz,
    Question, Quiz, QuizScore, QuizSubmission, QuizSummary,
};
use guuk_core::provider::Provider;
use guuk_core::session::Credential;
use guuk_core::traits::{
    AuthService, GenerationService, HistoryStore, LoginResponse, QuizStore, RegisterRequest,
};
use guuk_core::ServiceError;

#[derive(Default)]
struct MockState {
    /// username -> password
    users: HashMap<String, String>,
    /// token -> username
    tokens: HashMap<String, String>,
    quizzes: Vec<StoredQuiz>,
    /// username -> entries, newest first
    history: HashMap<String, Vec<HistoryEntry>>,
    generation_failure: Option<String>,
}

struct StoredQuiz {
    quiz: Quiz,
    created_at: NaiveDateTime,
}

/// A backend that keeps users, quizzes and history in memory.
///
/// Behaves like the HTTP service: answers are stripped from served quizzes,
/// every call except sign-in needs a token issued by [`login`](AuthService::login),
/// and generations and scored attempts are recorded in the user's history.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    unreachable: AtomicBool,
    call_count: AtomicU32,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account.
    pub fn with_user(self, username: &str, password: &str) -> Self {
        self.lock()
            .users
            .insert(username.to_string(), password.to_string());
        self
    }

    /// Store a quiz, answers included, and return its id.
    pub fn add_quiz(&self, title: &str, created_by: &str, questions: Vec<Question>) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.lock().quizzes.push(StoredQuiz {
            quiz: Quiz {
                id: id.clone(),
                title: title.to_string(),
                created_by: created_by.to_string(),
                questions,
            },
            created_at: now(),
        });
        id
    }

    /// Make every generation return an envelope without an entry.
    pub fn fail_generation_with(&self, detail: &str) {
        self.lock().generation_failure = Some(detail.to_string());
    }

    /// Simulate a network outage.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::Relaxed);
    }

    /// Number of collaborator calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) -> Result<MutexGuard<'_, MockState>, ServiceError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.unreachable.load(Ordering::Relaxed) {
            return Err(ServiceError::Unreachable("connection refused".into()));
        }
        Ok(self.lock())
    }

    /// Enter and resolve the credential to a username.
    fn authorize(
        &self,
        credential: &Credential,
    ) -> Result<(MutexGuard<'_, MockState>, String), ServiceError> {
        let state = self.enter()?;
        let user = state
            .tokens
            .get(credential.expose())
            .cloned()
            .ok_or_else(|| ServiceError::Rejected {
                status: 401,
                detail: Some("Could not validate credentials".into()),
            })?;
        Ok((state, user))
    }

    fn generate(
        &self,
        content_type: ContentType,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        let (mut state, _) = self.authorize(credential)?;
        if let Some(detail) = state.generation_failure.clone() {
            return Ok(GenerationEnvelope {
                status: Some("error".into()),
                entry: None,
                detail: Some(detail),
            });
        }

        let provider = request.provider;
        let mut entry = HistoryEntry {
            user: Some(request.user.clone()),
            prompt: Some(request.prompt.clone()),
            provider: Some(provider.to_string()),
            created_at: Some(now()),
            ..Default::default()
        };
        match content_type {
            ContentType::Text => {
                entry.entry_type = Some(format!("text_{provider}"));
                entry.output = Some(format!("[{provider}] {}", request.prompt));
            }
            ContentType::Image => {
                entry.entry_type = Some(format!("image_generation_{provider}"));
                entry.media_type = Some("image".into());
                entry.storage_url = Some(placeholder_url(provider, "Image", "1024x1024"));
            }
            ContentType::Video => {
                entry.entry_type = Some(format!("video_generation_{provider}"));
                entry.media_type = Some("video".into());
                entry.storage_url = Some(placeholder_url(provider, "Video", "640x360"));
            }
            ContentType::Animation => {
                entry.entry_type = Some(format!("cartoon_generation_{provider}"));
                entry.media_type = Some("animation".into());
                entry.storage_url = Some(placeholder_url(provider, "Cartoon", "400x300"));
            }
            ContentType::Voiceover => {
                entry.entry_type = Some(format!("voiceover_generation_{provider}"));
                entry.media_type = Some("audio".into());
                entry.storage_url = Some(placeholder_url(provider, "Voice", "300x50"));
            }
        }

        state
            .history
            .entry(request.user.clone())
            .or_default()
            .insert(0, entry.clone());
        Ok(GenerationEnvelope {
            status: Some("ok".into()),
            entry: Some(entry),
            detail: None,
        })
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn placeholder_url(provider: Provider, what: &str, size: &str) -> String {
    format!("https://placehold.co/{size}?text={provider}+{what}+Stub")
}

fn not_found() -> ServiceError {
    ServiceError::Rejected {
        status: 404,
        detail: Some("Quiz not found".into()),
    }
}

fn without_answers(quiz: &Quiz) -> Quiz {
    let mut quiz = quiz.clone();
    for q in &mut quiz.questions {
        q.correct_option_index = None;
    }
    quiz
}

#[async_trait]
impl AuthService for MockBackend {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ServiceError> {
        let mut state = self.enter()?;
        if state.users.get(username).map(String::as_str) != Some(password) {
            return Err(ServiceError::Rejected {
                status: 401,
                detail: Some("Incorrect username or password".into()),
            });
        }
        let token = format!("mock-token-{username}");
        state.tokens.insert(token.clone(), username.to_string());
        Ok(LoginResponse {
            access_token: token,
            token_type: "bearer".into(),
            user: username.to_string(),
        })
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), ServiceError> {
        let mut state = self.enter()?;
        if state.users.contains_key(&request.username) {
            return Err(ServiceError::Rejected {
                status: 400,
                detail: Some("Username already exists".into()),
            });
        }
        state
            .users
            .insert(request.username.clone(), request.password.clone());
        Ok(())
    }
}

#[async_trait]
impl QuizStore for MockBackend {
    async fn list(&self, credential: &Credential) -> Result<Vec<QuizSummary>, ServiceError> {
        let (state, _) = self.authorize(credential)?;
        Ok(state
            .quizzes
            .iter()
            .map(|stored| {
                let quiz = without_answers(&stored.quiz);
                QuizSummary {
                    id: quiz.id,
                    title: quiz.title,
                    created_by: quiz.created_by,
                    created_at: Some(stored.created_at),
                    questions: quiz.questions,
                }
            })
            .collect())
    }

    async fn get(&self, credential: &Credential, quiz_id: &str) -> Result<Quiz, ServiceError> {
        let (state, _) = self.authorize(credential)?;
        state
            .quizzes
            .iter()
            .find(|s| s.quiz.id == quiz_id)
            .map(|s| without_answers(&s.quiz))
            .ok_or_else(not_found)
    }

    async fn create(
        &self,
        credential: &Credential,
        quiz: &NewQuiz,
    ) -> Result<CreateQuizResponse, ServiceError> {
        let (mut state, user) = self.authorize(credential)?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        state.quizzes.push(StoredQuiz {
            quiz: Quiz {
                id: id.clone(),
                title: quiz.title.clone(),
                created_by: user,
                questions: quiz
                    .questions
                    .iter()
                    .map(|q| Question {
                        text: q.question.clone(),
                        options: q.options.clone(),
                        correct_option_index: Some(q.answer),
                    })
                    .collect(),
            },
            created_at: now(),
        });
        Ok(CreateQuizResponse {
            status: "created".into(),
            quiz_id: Some(id),
            detail: None,
        })
    }

    async fn submit(
        &self,
        credential: &Credential,
        submission: &QuizSubmission,
    ) -> Result<QuizScore, ServiceError> {
        let (mut state, user) = self.authorize(credential)?;
        let quiz = state
            .quizzes
            .iter()
            .find(|s| s.quiz.id == submission.quiz_id)
            .map(|s| s.quiz.clone())
            .ok_or_else(not_found)?;

        let score = quiz
            .questions
            .iter()
            .zip(&submission.answers)
            .filter(|(q, answer)| q.correct_option_index == Some(**answer))
            .count() as u32;
        let result = QuizScore {
            score,
            total: quiz.questions.len() as u32,
        };

        state.history.entry(user.clone()).or_default().insert(
            0,
            HistoryEntry {
                user: Some(user),
                title: Some(quiz.title),
                quiz_id: Some(quiz.id),
                score: Some(result.score),
                total: Some(result.total),
                submitted_at: Some(now()),
                ..Default::default()
            },
        );
        Ok(result)
    }
}

#[async_trait]
impl GenerationService for MockBackend {
    async fn generate_text(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.generate(ContentType::Text, credential, request)
    }

    async fn generate_image(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.generate(ContentType::Image, credential, request)
    }

    async fn generate_video(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.generate(ContentType::Video, credential, request)
    }

    async fn generate_animation(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.generate(ContentType::Animation, credential, request)
    }

    async fn generate_voiceover(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.generate(ContentType::Voiceover, credential, request)
    }
}

#[async_trait]
impl HistoryStore for MockBackend {
    async fn history(
        &self,
        credential: &Credential,
        user: &str,
    ) -> Result<Vec<HistoryEntry>, ServiceError> {
        let (state, _) = self.authorize(credential)?;
        Ok(state.history.get(user).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer: usize) -> Question {
        Question {
            text: "2+2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            correct_option_index: Some(answer),
        }
    }

    async fn signed_in(backend: &MockBackend) -> Credential {
        Credential::new(backend.login("kid1", "pw").await.unwrap().access_token)
    }

    #[tokio::test]
    async fn login_issues_token() {
        let backend = MockBackend::new().with_user("kid1", "pw");
        let response = backend.login("kid1", "pw").await.unwrap();
        assert_eq!(response.access_token, "mock-token-kid1");
        assert!(backend.login("kid1", "wrong").await.is_err());
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let backend = MockBackend::new();
        let err = backend.list(&Credential::new("forged")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected { status: 401, .. }));
    }

    #[tokio::test]
    async fn served_quizzes_hide_answers() {
        let backend = MockBackend::new().with_user("kid1", "pw");
        let id = backend.add_quiz("Math", "tutor", vec![question(1)]);
        let credential = signed_in(&backend).await;

        let quiz = backend.get(&credential, &id).await.unwrap();
        assert_eq!(quiz.questions[0].correct_option_index, None);
        let listed = backend.list(&credential).await.unwrap();
        assert_eq!(listed[0].questions[0].correct_option_index, None);
    }

    #[tokio::test]
    async fn submission_is_scored_and_recorded() {
        let backend = MockBackend::new().with_user("kid1", "pw");
        let id = backend.add_quiz("Math", "tutor", vec![question(1), question(2)]);
        let credential = signed_in(&backend).await;

        let score = backend
            .submit(
                &credential,
                &QuizSubmission {
                    quiz_id: id,
                    answers: vec![1, 0],
                },
            )
            .await
            .unwrap();
        assert_eq!(score, QuizScore { score: 1, total: 2 });

        let history = backend.history(&credential, "kid1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].is_quiz_result());
    }

    #[tokio::test]
    async fn generations_are_newest_first() {
        let backend = MockBackend::new().with_user("kid1", "pw");
        let credential = signed_in(&backend).await;

        let request = GenerationRequest::new("kid1", "a cat", Provider::Gemini);
        backend.generate_image(&credential, &request).await.unwrap();
        backend.generate_voiceover(&credential, &request).await.unwrap();

        let history = backend.history(&credential, "kid1").await.unwrap();
        let kinds: Vec<_> = history.iter().map(|e| e.kind().to_string()).collect();
        assert_eq!(kinds, vec!["audio", "image"]);
        assert!(history[1]
            .storage_url
            .as_deref()
            .unwrap()
            .contains("gemini+Image+Stub"));
    }

    #[tokio::test]
    async fn configured_failure_returns_detail() {
        let backend = MockBackend::new().with_user("kid1", "pw");
        let credential = signed_in(&backend).await;
        backend.fail_generation_with("quota exceeded");

        let envelope = backend
            .generate_text(
                &credential,
                &GenerationRequest::new("kid1", "hi", Provider::OpenAi),
            )
            .await
            .unwrap();
        assert!(envelope.entry.is_none());
        assert_eq!(envelope.detail.as_deref(), Some("quota exceeded"));
        assert!(backend.history(&credential, "kid1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn outage() {
        let backend = MockBackend::new().with_user("kid1", "pw");
        backend.set_unreachable(true);
        let err = backend.login("kid1", "pw").await.unwrap_err();
        assert!(matches!(err, ServiceError::Unreachable(_)));
    }
}
