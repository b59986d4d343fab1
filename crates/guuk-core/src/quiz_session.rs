//! Per-attempt quiz state machine.
//!
//! `Loading → Ready → Submitting → Scored`, with a completeness gate between
//! `Ready` and `Submitting`. A failed load leaves the session in `Loading`; a
//! failed submission returns it to `Ready`. Once `Scored`, the attempt is
//! frozen and a retake needs a new `QuizSession`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::{Quiz, QuizScore, QuizSubmission};
use crate::session::{Capability, Session};
use crate::traits::QuizStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizState {
    Loading,
    Ready,
    Submitting,
    Scored,
}

impl fmt::Display for QuizState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizState::Loading => write!(f, "loading"),
            QuizState::Ready => write!(f, "ready"),
            QuizState::Submitting => write!(f, "submitting"),
            QuizState::Scored => write!(f, "scored"),
        }
    }
}

/// One pass through a quiz. `answers` always has one slot per question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub quiz_id: String,
    pub answers: Vec<Option<usize>>,
    pub submitted: bool,
    pub score: Option<u32>,
    pub total: Option<u32>,
}

impl QuizAttempt {
    fn new(quiz: &Quiz) -> Self {
        Self {
            id: Uuid::new_v4(),
            quiz_id: quiz.id.clone(),
            answers: vec![None; quiz.questions.len()],
            submitted: false,
            score: None,
            total: None,
        }
    }

    /// Indices of the questions without an answer.
    pub fn unanswered(&self) -> Vec<usize> {
        self.answers
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.answers.iter().all(Option::is_some)
    }
}

/// A question alongside the answer given, for the post-submission review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub question: String,
    pub chosen: String,
    /// Known only when the served quiz carried its answer key.
    pub correct: Option<bool>,
}

pub struct QuizSession {
    store: Arc<dyn QuizStore>,
    state: QuizState,
    quiz: Option<Quiz>,
    attempt: Option<QuizAttempt>,
}

impl QuizSession {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self {
            store,
            state: QuizState::Loading,
            quiz: None,
            attempt: None,
        }
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    pub fn attempt(&self) -> Option<&QuizAttempt> {
        self.attempt.as_ref()
    }

    pub fn score(&self) -> Option<QuizScore> {
        let attempt = self.attempt.as_ref()?;
        Some(QuizScore {
            score: attempt.score?,
            total: attempt.total?,
        })
    }

    /// Fetch the quiz and open a fresh attempt with every answer unset.
    ///
    /// Only valid in `Loading`. On failure the session stays in `Loading` and
    /// `load` may be called again.
    #[instrument(skip(self, session), fields(user = %session.username()))]
    pub async fn load(&mut self, session: &Session, quiz_id: &str) -> Result<&Quiz, CoreError> {
        self.expect_state(QuizState::Loading, "load a quiz")?;
        session.require(Capability::TakeQuizzes)?;

        let quiz = self
            .store
            .get(session.credential(), quiz_id)
            .await
            .map_err(|e| {
                tracing::warn!("failed to load quiz {quiz_id}: {e}");
                CoreError::from(e)
            })?;

        let attempt = QuizAttempt::new(&quiz);
        tracing::debug!(attempt = %attempt.id, questions = quiz.questions.len(), "quiz ready");
        self.attempt = Some(attempt);
        self.state = QuizState::Ready;
        Ok(self.quiz.insert(quiz))
    }

    /// Record an answer. Last write wins; completeness is checked on submit.
    pub fn set_answer(&mut self, question_index: usize, option_index: usize) -> Result<(), CoreError> {
        self.expect_state(QuizState::Ready, "answer")?;
        let attempt = self.attempt.as_mut().ok_or(CoreError::InvalidState {
            operation: "answer",
            state: "no attempt is open".into(),
        })?;

        let len = attempt.answers.len();
        let slot = attempt.answers.get_mut(question_index).ok_or_else(|| {
            CoreError::Validation(format!(
                "question {question_index} does not exist (quiz has {len})"
            ))
        })?;
        *slot = Some(option_index);
        Ok(())
    }

    /// Completeness gate: every question must have an answer.
    pub fn validate(&self) -> Result<(), CoreError> {
        let Some(attempt) = &self.attempt else {
            return Err(CoreError::Validation("no quiz loaded".into()));
        };
        let unanswered = attempt.unanswered();
        if unanswered.is_empty() {
            return Ok(());
        }
        let listed: Vec<String> = unanswered.iter().map(|i| (i + 1).to_string()).collect();
        Err(CoreError::Validation(format!(
            "please answer all questions (missing: {})",
            listed.join(", ")
        )))
    }

    /// Validate, send the answers for scoring and store the result.
    ///
    /// Incomplete answers fail with `Validation` without any network call. A
    /// collaborator failure returns the session to `Ready`, as does dropping
    /// the future before it completes.
    #[instrument(skip(self, session), fields(user = %session.username()))]
    pub async fn submit(&mut self, session: &Session) -> Result<QuizScore, CoreError> {
        self.expect_state(QuizState::Ready, "submit")?;
        self.validate()?;

        let submission = match &self.attempt {
            Some(attempt) => QuizSubmission {
                quiz_id: attempt.quiz_id.clone(),
                answers: attempt.answers.iter().flatten().copied().collect(),
            },
            None => return Err(CoreError::Validation("no quiz loaded".into())),
        };

        let in_flight = InFlight::begin(&mut self.state);
        let result = self.store.submit(session.credential(), &submission).await;

        match result {
            Ok(score) => {
                in_flight.finish(QuizState::Scored);
                if let Some(attempt) = self.attempt.as_mut() {
                    attempt.submitted = true;
                    attempt.score = Some(score.score);
                    attempt.total = Some(score.total);
                }
                tracing::info!(
                    quiz_id = %submission.quiz_id,
                    score = score.score,
                    total = score.total,
                    "quiz scored"
                );
                Ok(score)
            }
            Err(e) => {
                drop(in_flight);
                tracing::warn!("quiz submission failed: {e}");
                Err(e.into())
            }
        }
    }

    /// The given answers next to their questions. Only available once scored.
    pub fn review(&self) -> Result<Vec<ReviewItem>, CoreError> {
        self.expect_state(QuizState::Scored, "review")?;
        let (Some(quiz), Some(attempt)) = (&self.quiz, &self.attempt) else {
            return Ok(Vec::new());
        };

        Ok(quiz
            .questions
            .iter()
            .zip(&attempt.answers)
            .map(|(question, answer)| {
                let chosen = answer
                    .and_then(|i| question.options.get(i))
                    .cloned()
                    .unwrap_or_default();
                ReviewItem {
                    question: question.text.clone(),
                    chosen,
                    correct: question
                        .correct_option_index
                        .zip(*answer)
                        .map(|(right, given)| right == given),
                }
            })
            .collect())
    }

    fn expect_state(&self, expected: QuizState, operation: &'static str) -> Result<(), CoreError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CoreError::InvalidState {
                operation,
                state: self.state.to_string(),
            })
        }
    }
}

/// Holds the session in `Submitting` while a scoring request is in flight and
/// puts it back to `Ready` unless finished.
struct InFlight<'a> {
    state: &'a mut QuizState,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a mut QuizState) -> Self {
        *state = QuizState::Submitting;
        Self { state }
    }

    fn finish(self, next: QuizState) {
        *self.state = next;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if *self.state == QuizState::Submitting {
            *self.state = QuizState::Ready;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{math_quiz, session_for, StubQuizStore};

    fn two_question_quiz() -> Quiz {
        let mut quiz = math_quiz();
        quiz.id = "q2".into();
        quiz.questions.push(crate::model::Question {
            text: "3+3?".into(),
            options: vec!["6".into(), "7".into()],
            correct_option_index: Some(0),
        });
        quiz
    }

    async fn ready_session(store: &Arc<StubQuizStore>, quiz_id: &str) -> QuizSession {
        let mut qs = QuizSession::new(store.clone());
        qs.load(&session_for("kid1"), quiz_id).await.unwrap();
        qs
    }

    #[tokio::test]
    async fn load_opens_unanswered_attempt() {
        let store = Arc::new(StubQuizStore::with_quiz(two_question_quiz()));
        let qs = ready_session(&store, "q2").await;

        assert_eq!(qs.state(), QuizState::Ready);
        let attempt = qs.attempt().unwrap();
        assert_eq!(attempt.answers.len(), qs.quiz().unwrap().questions.len());
        assert!(attempt.answers.iter().all(Option::is_none));
        assert!(!attempt.submitted);
        assert_eq!(attempt.score, None);
    }

    #[tokio::test]
    async fn failed_load_stays_loading_and_can_retry() {
        let store = Arc::new(StubQuizStore::with_quiz(math_quiz()));
        let mut qs = QuizSession::new(store.clone());

        let err = qs.load(&session_for("kid1"), "missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Quiz not found");
        assert_eq!(qs.state(), QuizState::Loading);
        assert!(qs.attempt().is_none());

        qs.load(&session_for("kid1"), "math").await.unwrap();
        assert_eq!(qs.state(), QuizState::Ready);
    }

    #[tokio::test]
    async fn scores_math_quiz() {
        let store = Arc::new(StubQuizStore::with_quiz(math_quiz()));
        let mut qs = ready_session(&store, "math").await;

        qs.set_answer(0, 1).unwrap();
        let score = qs.submit(&session_for("kid1")).await.unwrap();

        assert_eq!(score, QuizScore { score: 1, total: 1 });
        assert_eq!(qs.state(), QuizState::Scored);
        assert_eq!(qs.score(), Some(score));
        assert!(qs.attempt().unwrap().submitted);
    }

    #[tokio::test]
    async fn unanswered_submit_is_rejected_without_network_call() {
        let store = Arc::new(StubQuizStore::with_quiz(math_quiz()));
        let mut qs = ready_session(&store, "math").await;

        let err = qs.submit(&session_for("kid1")).await.unwrap_err();
        assert!(err.is_validation(), "got {err:?}");
        assert_eq!(store.submit_calls(), 0);
        assert_eq!(qs.state(), QuizState::Ready);
    }

    #[tokio::test]
    async fn partially_answered_lists_missing_questions() {
        let store = Arc::new(StubQuizStore::with_quiz(two_question_quiz()));
        let mut qs = ready_session(&store, "q2").await;
        qs.set_answer(0, 1).unwrap();

        let err = qs.submit(&session_for("kid1")).await.unwrap_err();
        assert!(err.to_string().contains("missing: 2"), "got {err}");
        assert_eq!(store.submit_calls(), 0);
    }

    #[tokio::test]
    async fn last_answer_wins() {
        let store = Arc::new(StubQuizStore::with_quiz(math_quiz()));
        let mut qs = ready_session(&store, "math").await;
        qs.set_answer(0, 3).unwrap();
        qs.set_answer(0, 1).unwrap();
        assert_eq!(qs.attempt().unwrap().answers, vec![Some(1)]);
    }

    #[tokio::test]
    async fn answer_out_of_range_is_rejected() {
        let store = Arc::new(StubQuizStore::with_quiz(math_quiz()));
        let mut qs = ready_session(&store, "math").await;
        assert!(qs.set_answer(5, 0).unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn answering_before_load_is_invalid() {
        let store = Arc::new(StubQuizStore::with_quiz(math_quiz()));
        let mut qs = QuizSession::new(store);
        assert!(matches!(
            qs.set_answer(0, 0),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn scored_session_is_frozen() {
        let store = Arc::new(StubQuizStore::with_quiz(math_quiz()));
        let mut qs = ready_session(&store, "math").await;
        qs.set_answer(0, 1).unwrap();
        qs.submit(&session_for("kid1")).await.unwrap();

        let again = qs.submit(&session_for("kid1")).await.unwrap_err();
        assert!(matches!(again, CoreError::InvalidState { .. }));
        assert!(qs.set_answer(0, 2).is_err());
        assert_eq!(store.submit_calls(), 1);
        assert_eq!(qs.attempt().unwrap().answers, vec![Some(1)]);
        assert_eq!(qs.score().unwrap().score, 1);
    }

    #[tokio::test]
    async fn transport_failure_returns_to_ready() {
        let store = Arc::new(StubQuizStore::with_quiz(math_quiz()));
        let mut qs = ready_session(&store, "math").await;
        qs.set_answer(0, 1).unwrap();

        store.fail_next_submit();
        let err = qs.submit(&session_for("kid1")).await.unwrap_err();
        assert!(matches!(err, CoreError::Transport(_)));
        assert_eq!(qs.state(), QuizState::Ready);
        assert_eq!(qs.score(), None);

        let score = qs.submit(&session_for("kid1")).await.unwrap();
        assert_eq!(score.score, 1);
    }

    #[tokio::test]
    async fn dropped_submission_returns_to_ready() {
        let store = Arc::new(StubQuizStore::with_quiz(math_quiz()));
        let mut qs = ready_session(&store, "math").await;
        qs.set_answer(0, 1).unwrap();

        store.hang_next_submit();
        let session = session_for("kid1");
        let outcome =
            tokio::time::timeout(std::time::Duration::from_millis(20), qs.submit(&session)).await;
        assert!(outcome.is_err());
        assert_eq!(qs.state(), QuizState::Ready);
    }

    #[tokio::test]
    async fn review_after_scoring() {
        let store = Arc::new(StubQuizStore::with_quiz(two_question_quiz()));
        let mut qs = ready_session(&store, "q2").await;
        assert!(qs.review().is_err());

        qs.set_answer(0, 1).unwrap();
        qs.set_answer(1, 1).unwrap();
        let score = qs.submit(&session_for("kid1")).await.unwrap();
        assert_eq!(score, QuizScore { score: 1, total: 2 });

        let review = qs.review().unwrap();
        assert_eq!(review.len(), 2);
        assert_eq!(review[0].chosen, "4");
        assert_eq!(review[1].chosen, "7");
        // The stub serves quizzes without answer keys.
        assert_eq!(review[0].correct, None);
    }
}
