//! Quiz authoring: draft editing, validation and submission.
//!
//! Drafts can also be loaded from TOML files:
//!
//! ```toml
//! title = "Math"
//!
//! [[questions]]
//! text = "2+2?"
//! options = ["3", "4", "5", "6"]
//! answer = 1
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::CoreError;
use crate::model::{NewQuestion, NewQuiz};
use crate::session::{Capability, Session};
use crate::traits::QuizStore;

/// Options a freshly added question starts with.
pub const DEFAULT_OPTION_COUNT: usize = 4;

const MIN_OPTIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub text: String,
    pub options: Vec<String>,
    /// Index of the single correct option.
    #[serde(rename = "answer")]
    pub correct_option_index: usize,
}

impl Default for QuestionDraft {
    fn default() -> Self {
        Self {
            text: String::new(),
            options: vec![String::new(); DEFAULT_OPTION_COUNT],
            correct_option_index: 0,
        }
    }
}

/// A quiz being written. Always holds at least one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDraft {
    pub title: String,
    pub questions: Vec<QuestionDraft>,
}

impl Default for QuizDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            questions: vec![QuestionDraft::default()],
        }
    }
}

impl QuizDraft {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let draft: QuizDraft = toml::from_str(content).context("failed to parse quiz draft")?;
        Ok(draft)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read quiz draft: {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Check the draft is complete enough to send.
    ///
    /// Title, question texts and option texts must be non-blank; every
    /// question needs at least two options and its correct index must point
    /// at one of them.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("quiz title is required".into()));
        }
        if self.questions.is_empty() {
            return Err(CoreError::Validation(
                "a quiz needs at least one question".into(),
            ));
        }
        for (i, q) in self.questions.iter().enumerate() {
            let n = i + 1;
            if q.text.trim().is_empty() {
                return Err(CoreError::Validation(format!("question {n} has no text")));
            }
            if q.options.len() < MIN_OPTIONS {
                return Err(CoreError::Validation(format!(
                    "question {n} needs at least {MIN_OPTIONS} options"
                )));
            }
            if let Some(j) = q.options.iter().position(|o| o.trim().is_empty()) {
                return Err(CoreError::Validation(format!(
                    "question {n}, option {} is empty",
                    j + 1
                )));
            }
            if q.correct_option_index >= q.options.len() {
                return Err(CoreError::Validation(format!(
                    "question {n} marks option {} as correct but has {} options",
                    q.correct_option_index + 1,
                    q.options.len()
                )));
            }
        }
        Ok(())
    }

    fn to_new_quiz(&self, created_by: &str) -> NewQuiz {
        NewQuiz {
            title: self.title.trim().to_string(),
            questions: self
                .questions
                .iter()
                .map(|q| NewQuestion {
                    question: q.text.trim().to_string(),
                    options: q.options.iter().map(|o| o.trim().to_string()).collect(),
                    answer: q.correct_option_index,
                })
                .collect(),
            created_by: created_by.to_string(),
        }
    }
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedQuiz {
    pub quiz_id: Option<String>,
    pub title: String,
}

pub struct QuizAuthoring {
    store: Arc<dyn QuizStore>,
    draft: QuizDraft,
}

impl QuizAuthoring {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self::with_draft(store, QuizDraft::default())
    }

    pub fn with_draft(store: Arc<dyn QuizStore>, draft: QuizDraft) -> Self {
        Self { store, draft }
    }

    pub fn draft(&self) -> &QuizDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut QuizDraft {
        &mut self.draft
    }

    /// Append an empty question and return its index.
    pub fn add_question(&mut self) -> usize {
        self.draft.questions.push(QuestionDraft::default());
        self.draft.questions.len() - 1
    }

    /// Remove a question. Rejected when it is the last one.
    pub fn remove_question(&mut self, index: usize) -> Result<QuestionDraft, CoreError> {
        if self.draft.questions.len() <= 1 {
            return Err(CoreError::Validation(
                "a quiz must keep at least one question".into(),
            ));
        }
        if index >= self.draft.questions.len() {
            return Err(CoreError::Validation(format!(
                "question {index} does not exist"
            )));
        }
        Ok(self.draft.questions.remove(index))
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.draft.validate()
    }

    /// Validate and send the draft. On success the draft is reset to a single
    /// empty question.
    #[instrument(skip_all, fields(user = %session.username(), title = %self.draft.title))]
    pub async fn submit(&mut self, session: &Session) -> Result<CreatedQuiz, CoreError> {
        session.require(Capability::AuthorQuizzes)?;
        self.draft.validate()?;

        let quiz = self.draft.to_new_quiz(session.username());
        let response = self.store.create(session.credential(), &quiz).await?;
        if !response.is_created() {
            let reason = response
                .detail
                .unwrap_or_else(|| format!("quiz was not created (status: {})", response.status));
            tracing::warn!("quiz creation declined: {reason}");
            return Err(CoreError::Reported(reason));
        }

        tracing::info!(quiz_id = ?response.quiz_id, "quiz created");
        self.draft = QuizDraft::default();
        Ok(CreatedQuiz {
            quiz_id: response.quiz_id,
            title: quiz.title,
        })
    }
}
