//! Quiz storage endpoints.

use async_trait::async_trait;
use tracing::instrument;

use guuk_core::model::{CreateQuizResponse, NewQuiz, Quiz, QuizScore, QuizSubmission, QuizSummary};
use guuk_core::session::Credential;
use guuk_core::traits::QuizStore;
use guuk_core::ServiceError;

use crate::backend::HttpBackend;

#[async_trait]
impl QuizStore for HttpBackend {
    #[instrument(skip_all)]
    async fn list(&self, credential: &Credential) -> Result<Vec<QuizSummary>, ServiceError> {
        self.send_json(self.get_request("/quiz/list", credential)).await
    }

    #[instrument(skip(self, credential))]
    async fn get(&self, credential: &Credential, quiz_id: &str) -> Result<Quiz, ServiceError> {
        let url = self.url_with_segment("/quiz", quiz_id)?;
        let request = self
            .raw_client()
            .get(url)
            .bearer_auth(credential.expose());
        self.send_json(request).await
    }

    #[instrument(skip_all, fields(title = %quiz.title))]
    async fn create(
        &self,
        credential: &Credential,
        quiz: &NewQuiz,
    ) -> Result<CreateQuizResponse, ServiceError> {
        self.send_json(self.post_request("/quiz/create", Some(credential)).json(quiz))
            .await
    }

    #[instrument(skip_all, fields(quiz_id = %submission.quiz_id))]
    async fn submit(
        &self,
        credential: &Credential,
        submission: &QuizSubmission,
    ) -> Result<QuizScore, ServiceError> {
        self.send_json(self.post_request("/quiz/submit", Some(credential)).json(submission))
            .await
    }
}
