//! The `guuk generate` command.

use std::path::Path;

use anyhow::{bail, Result};

use guuk_core::dispatcher::GenerationDispatcher;
use guuk_core::history::HistoryAggregator;
use guuk_core::model::{ContentType, GenerationRequest};
use guuk_core::provider::Provider;

use super::App;

pub async fn execute(
    config_path: Option<&Path>,
    content_type: ContentType,
    prompt: String,
    provider: Option<Provider>,
    model: Option<String>,
) -> Result<()> {
    let app = App::load(config_path)?;
    let session = app.session()?;

    let provider = provider.unwrap_or(app.config.default_provider);
    let mut request = GenerationRequest::new(session.username(), prompt, provider);
    if let Some(model) = model {
        request = request.with_model(model);
    }
    if !request.is_submittable() {
        bail!("prompt must not be empty");
    }

    let dispatcher = GenerationDispatcher::new(app.backend.clone());
    let mut history = HistoryAggregator::new();
    let entry = dispatcher
        .dispatch(session, content_type, &request, &mut history)
        .await?;

    println!("Generated {} with {provider}", entry.kind());
    if let Some(url) = &entry.storage_url {
        println!("  {url}");
    }
    if let Some(output) = &entry.output {
        println!("\n{output}");
    }
    Ok(())
}
