//! Quiz listing.

use std::sync::Arc;

use tracing::instrument;

use crate::error::CoreError;
use crate::model::QuizSummary;
use crate::session::Session;
use crate::traits::QuizStore;

/// Retrieves the quizzes available to the signed-in user.
pub struct QuizCatalog {
    store: Arc<dyn QuizStore>,
}

impl QuizCatalog {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self { store }
    }

    #[instrument(skip_all, fields(user = %session.username()))]
    pub async fn list(&self, session: &Session) -> Result<Vec<QuizSummary>, CoreError> {
        let quizzes = self.store.list(session.credential()).await?;
        tracing::debug!(count = quizzes.len(), "quizzes listed");
        Ok(quizzes)
    }
}
