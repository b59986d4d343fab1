//! Generation endpoints.

use async_trait::async_trait;
use tracing::instrument;

use guuk_core::model::{ContentType, GenerationEnvelope, GenerationRequest};
use guuk_core::session::Credential;
use guuk_core::traits::GenerationService;
use guuk_core::ServiceError;

use crate::backend::HttpBackend;

/// Endpoint serving a content type.
pub fn endpoint(content_type: ContentType) -> &'static str {
    match content_type {
        ContentType::Text => "/generate-text-advanced",
        ContentType::Image => "/generate-image-advanced",
        ContentType::Video => "/generate-video-advanced",
        ContentType::Animation => "/generate-cartoon-advanced",
        ContentType::Voiceover => "/generate-voiceover-advanced",
    }
}

impl HttpBackend {
    #[instrument(skip(self, credential, request), fields(provider = %request.provider))]
    async fn generate(
        &self,
        content_type: ContentType,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        let builder = self
            .post_request(endpoint(content_type), Some(credential))
            .json(request);
        self.send_json(builder).await
    }
}

#[async_trait]
impl GenerationService for HttpBackend {
    async fn generate_text(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.generate(ContentType::Text, credential, request).await
    }

    async fn generate_image(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.generate(ContentType::Image, credential, request).await
    }

    async fn generate_video(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.generate(ContentType::Video, credential, request).await
    }

    async fn generate_animation(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.generate(ContentType::Animation, credential, request)
            .await
    }

    async fn generate_voiceover(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationEnvelope, ServiceError> {
        self.generate(ContentType::Voiceover, credential, request)
            .await
    }
}
