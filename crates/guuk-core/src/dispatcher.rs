//! Generation dispatch.
//!
//! Routes a request to the capability matching its content type, fills in the
//! provider's default model when none was chosen, and turns the returned
//! envelope into a history entry. Every successful dispatch prepends exactly
//! one entry to the history; failures prepend nothing.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::instrument;

use crate::error::CoreError;
use crate::history::HistoryAggregator;
use crate::model::{ContentType, GenerationEnvelope, GenerationRequest, HistoryEntry};
use crate::provider::ModelCatalog;
use crate::session::{Capability, Session};
use crate::traits::GenerationService;

/// Surfaced when the generation service cannot be reached.
pub const UNREACHABLE_MESSAGE: &str = "could not reach generation service";

/// Surfaced when the service declines without saying why.
pub const GENERIC_GENERATION_FAILURE: &str = "generation failed";

pub struct GenerationDispatcher {
    service: Arc<dyn GenerationService>,
    catalog: ModelCatalog,
}

impl GenerationDispatcher {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self::with_catalog(service, ModelCatalog::builtin())
    }

    pub fn with_catalog(service: Arc<dyn GenerationService>, catalog: ModelCatalog) -> Self {
        Self { service, catalog }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Generate content and prepend the resulting entry to `history`.
    ///
    /// The prompt must be non-empty; that is the caller's gate (see
    /// [`GenerationRequest::is_submittable`]) and is not re-checked here.
    pub async fn dispatch(
        &self,
        session: &Session,
        content_type: ContentType,
        request: &GenerationRequest,
        history: &mut HistoryAggregator,
    ) -> Result<HistoryEntry, CoreError> {
        let entry = self.generate(session, content_type, request).await?;
        history.prepend(entry.clone());
        Ok(entry)
    }

    /// Dispatch several requests concurrently.
    ///
    /// Entries are prepended as their requests complete, so their order
    /// relative to each other is unspecified. Results come back in request
    /// order.
    pub async fn dispatch_all(
        &self,
        session: &Session,
        requests: &[(ContentType, GenerationRequest)],
        history: &mut HistoryAggregator,
    ) -> Vec<Result<HistoryEntry, CoreError>> {
        let mut pending: FuturesUnordered<_> = requests
            .iter()
            .enumerate()
            .map(|(i, (content_type, request))| async move {
                (i, self.generate(session, *content_type, request).await)
            })
            .collect();

        let mut results: Vec<Option<Result<HistoryEntry, CoreError>>> =
            requests.iter().map(|_| None).collect();
        while let Some((i, result)) = pending.next().await {
            if let Ok(entry) = &result {
                history.prepend(entry.clone());
            }
            results[i] = Some(result);
        }

        results.into_iter().flatten().collect()
    }

    /// Invoke the capability and normalize its envelope, without touching
    /// any history.
    #[instrument(skip(self, session, request), fields(provider = %request.provider))]
    pub async fn generate(
        &self,
        session: &Session,
        content_type: ContentType,
        request: &GenerationRequest,
    ) -> Result<HistoryEntry, CoreError> {
        session.require(Capability::Generate)?;

        let resolved = self.resolve_model(content_type, request);
        tracing::debug!(model = ?resolved.model, "dispatching generation");

        let credential = session.credential();
        let service = self.service.as_ref();
        let outcome = match content_type {
            ContentType::Text => service.generate_text(credential, &resolved).await,
            ContentType::Image => service.generate_image(credential, &resolved).await,
            ContentType::Video => service.generate_video(credential, &resolved).await,
            ContentType::Animation => service.generate_animation(credential, &resolved).await,
            ContentType::Voiceover => service.generate_voiceover(credential, &resolved).await,
        };

        let envelope = outcome.map_err(|e| {
            tracing::warn!("generation request failed: {e}");
            CoreError::from_service(e, UNREACHABLE_MESSAGE, GENERIC_GENERATION_FAILURE)
        })?;
        into_entry(envelope)
    }

    /// Copy of `request` with a blank model replaced by the catalog default.
    /// When the catalog knows no default the model stays unset and the
    /// service picks one.
    fn resolve_model(&self, content_type: ContentType, request: &GenerationRequest) -> GenerationRequest {
        let model = request.explicit_model().map(str::to_string).or_else(|| {
            self.catalog
                .default_model(request.provider, content_type)
                .map(str::to_string)
        });
        GenerationRequest {
            model,
            ..request.clone()
        }
    }
}

fn into_entry(envelope: GenerationEnvelope) -> Result<HistoryEntry, CoreError> {
    match envelope.entry {
        Some(entry) => {
            tracing::info!(kind = %entry.kind(), "generation succeeded");
            Ok(entry)
        }
        None => {
            let detail = envelope
                .detail
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| GENERIC_GENERATION_FAILURE.to_string());
            tracing::warn!("generation returned no entry: {detail}");
            Err(CoreError::Reported(detail))
        }
    }
}
