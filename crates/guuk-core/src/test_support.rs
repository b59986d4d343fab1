//! In-crate stubs for the collaborator traits.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::model::{
    ContentType, CreateQuizResponse, GenerationEnvelope, GenerationRequest, HistoryEntry, NewQuiz,
    Question, Quiz, QuizScore, QuizSubmission, QuizSummary,
};
use crate::session::{Credential, RolePolicy, Session};
use crate::traits::{
    AuthService, GenerationService, HistoryStore, LoginResponse, QuizStore, RegisterRequest,
};

pub fn session_for(user: &str) -> Session {
    Session::new(user, Credential::new(format!("token-{user}")), &RolePolicy::default())
}

pub fn admin_session() -> Session {
    Session::new(
        "admin",
        Credential::new("token-admin"),
        &RolePolicy::new(["admin"]),
    )
}

pub fn math_quiz() -> Quiz {
    Quiz {
        id: "math".into(),
        title: "Math".into(),
        created_by: "tutor".into(),
        questions: vec![Question {
            text: "2+2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            correct_option_index: Some(1),
        }],
    }
}

fn unreachable() -> ServiceError {
    ServiceError::Unreachable("connection refused".into())
}

// ---------------------------------------------------------------------------

pub struct StubAuth {
    username: String,
    password: String,
    calls: AtomicU32,
}

impl StubAuth {
    pub fn accepting(username: &str, password: &str) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AuthService for StubAuth {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ServiceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if username == self.username && password == self.password {
            Ok(LoginResponse {
                access_token: format!("token-{username}"),
                token_type: "bearer".into(),
                user: username.into(),
            })
        } else {
            Err(ServiceError::Rejected {
                status: 401,
                detail: Some("Incorrect username or password".into()),
            })
        }
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<(), ServiceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

// ---------------------------------------------------------------------------

pub struct StubQuizStore {
    quizzes: Mutex<Vec<Quiz>>,
    created: Mutex<Vec<NewQuiz>>,
    create_response: Mutex<Option<CreateQuizResponse>>,
    unreachable: bool,
    fail_next_submit: AtomicBool,
    hang_next_submit: AtomicBool,
    submit_calls: AtomicU32,
}

impl StubQuizStore {
    pub fn with_quiz(quiz: Quiz) -> Self {
        Self {
            quizzes: Mutex::new(vec![quiz]),
            created: Mutex::new(Vec::new()),
            create_response: Mutex::new(None),
            unreachable: false,
            fail_next_submit: AtomicBool::new(false),
            hang_next_submit: AtomicBool::new(false),
            submit_calls: AtomicU32::new(0),
        }
    }

    pub fn empty() -> Self {
        let store = Self::with_quiz(math_quiz());
        store.quizzes.lock().unwrap().clear();
        store
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::empty()
        }
    }

    pub fn respond_to_create(&self, response: CreateQuizResponse) {
        *self.create_response.lock().unwrap() = Some(response);
    }

    pub fn fail_next_submit(&self) {
        self.fail_next_submit.store(true, Ordering::Relaxed);
    }

    pub fn hang_next_submit(&self) {
        self.hang_next_submit.store(true, Ordering::Relaxed);
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::Relaxed)
    }

    pub fn created(&self) -> Vec<NewQuiz> {
        self.created.lock().unwrap().clone()
    }

    fn find(&self, quiz_id: &str) -> Result<Quiz, ServiceError> {
        self.quizzes
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.id == quiz_id)
            .cloned()
            .ok_or(ServiceError::Rejected {
                status: 404,
                detail: Some("Quiz not found".into()),
            })
    }
}

fn strip_answers(mut quiz: Quiz) -> Quiz {
    for q in &mut quiz.questions {
        q.correct_option_index = None;
    }
    quiz
}

#[async_trait]
impl QuizStore for StubQuizStore {
    async fn list(&self, _credential: &Credential) -> Result<Vec<QuizSummary>, ServiceError> {
        if self.unreachable {
            return Err(unreachable());
        }
        Ok(self
            .quizzes
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(|q| {
                let q = strip_answers(q);
                QuizSummary {
                    id: q.id,
                    title: q.title,
                    created_by: q.created_by,
                    created_at: None,
                    questions: q.questions,
                }
            })
            .collect())
    }

    async fn get(&self, _credential: &Credential, quiz_id: &str) -> Result<Quiz, ServiceError> {
        if self.unreachable {
            return Err(unreachable());
        }
        self.find(quiz_id).map(strip_answers)
    }

    async fn create(
        &self,
        _credential: &Credential,
        quiz: &NewQuiz,
    ) -> Result<CreateQuizResponse, ServiceError> {
        if self.unreachable {
            return Err(unreachable());
        }
        self.created.lock().unwrap().push(quiz.clone());
        let configured = self.create_response.lock().unwrap().clone();
        Ok(configured.unwrap_or(CreateQuizResponse {
            status: "created".into(),
            quiz_id: Some(format!("quiz-{}", self.created.lock().unwrap().len())),
            detail: None,
        }))
    }

    async fn submit(
        &self,
        _credential: &Credential,
        submission: &QuizSubmission,
    ) -> Result<QuizScore, ServiceError> {
        if self.hang_next_submit.swap(false, Ordering::Relaxed) {
            futures::future::pending::<()>().await;
        }
        self.submit_calls.fetch_add(1, Ordering::Relaxed);
        if self.unreachable || self.fail_next_submit.swap(false, Ordering::Relaxed) {
            return Err(unreachable());
        }
        let quiz = self.find(&submission.quiz_id)?;
        let score = quiz
            .questions
            .iter()
            .zip(&submission.answers)
            .filter(|(q, a)| q.correct_option_index == Some(**a))
            .count() as u32;
        Ok(QuizScore {
            score,
            total: quiz.questions.len() as u32,
        })
    }
}

// ---------------------------------------------------------------------------

enum GenerationBehaviour {
    Echo,
    Fixed(GenerationEnvelope),
    Declined(u16),
    Unreachable,
}

pub struct StubGeneration {
    behaviour: GenerationBehaviour,
    calls: Mutex<Vec<(ContentType, GenerationRequest)>>,
}

impl StubGeneration {
    /// Answers every request with an entry built from the request.
    pub fn echo() -> Self {
        Self::with(GenerationBehaviour::Echo)
    }

    pub fn returning(envelope: GenerationEnvelope) -> Self {
        Self::with(GenerationBehaviour::Fixed(envelope))
    }

    /// Rejects every request with `status` and no detail body.
    pub fn declining(status: u16) -> Self {
        Self::with(GenerationBehaviour::Declined(status))
    }

    pub fn unreachable() -> Self {
        Self::with(GenerationBehaviour::Unreachable)
    }

    fn with(behaviour: GenerationBehaviour) -> Self {
        Self {
            behaviour,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(ContentType, GenerationRequest)> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond(
        &self,
        content_type: ContentType,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push((content_type, request.clone()));
        // Longer prompts take longer, so concurrent dispatches finish out of order.
        tokio::time::sleep(std::time::Duration::from_millis(request.prompt.len() as u64)).await;
        match &self.behaviour {
            GenerationBehaviour::Echo => Ok(GenerationEnvelope {
                status: Some("ok".into()),
                entry: Some(HistoryEntry {
                    user: Some(request.user.clone()),
                    prompt: Some(request.prompt.clone()),
                    media_type: Some(content_type.media_kind().into()),
                    storage_url: Some(format!("https://x/{}", request.prompt.replace(' ', "_"))),
                    provider: Some(request.provider.to_string()),
                    ..Default::default()
                }),
                detail: None,
            }),
            GenerationBehaviour::Fixed(envelope) => Ok(envelope.clone()),
            GenerationBehaviour::Declined(status) => Err(ServiceError::Rejected {
                status: *status,
                detail: None,
            }),
            GenerationBehaviour::Unreachable => Err(unreachable()),
        }
    }
}

#[async_trait]
impl GenerationService for StubGeneration {
    async fn generate_text(
        &self,
        _credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.respond(ContentType::Text, request).await
    }

    async fn generate_image(
        &self,
        _credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.respond(ContentType::Image, request).await
    }

    async fn generate_video(
        &self,
        _credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.respond(ContentType::Video, request).await
    }

    async fn generate_animation(
        &self,
        _credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.respond(ContentType::Animation, request).await
    }

    async fn generate_voiceover(
        &self,
        _credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.respond(ContentType::Voiceover, request).await
    }
}

// ---------------------------------------------------------------------------

pub struct StubHistory {
    entries: Vec<HistoryEntry>,
}

impl StubHistory {
    pub fn new(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl HistoryStore for StubHistory {
    async fn history(
        &self,
        _credential: &Credential,
        user: &str,
    ) -> Result<Vec<HistoryEntry>, ServiceError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.user.as_deref().map_or(true, |u| u == user))
            .cloned()
            .collect())
    }
}
