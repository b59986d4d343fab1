//! History endpoint and media downloads.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::instrument;

use guuk_core::model::HistoryEntry;
use guuk_core::session::Credential;
use guuk_core::traits::HistoryStore;
use guuk_core::ServiceError;

use crate::backend::HttpBackend;
use crate::error::ClientError;

#[async_trait]
impl HistoryStore for HttpBackend {
    #[instrument(skip(self, credential))]
    async fn history(
        &self,
        credential: &Credential,
        user: &str,
    ) -> Result<Vec<HistoryEntry>, ServiceError> {
        let url = reqwest::Url::parse_with_params(&self.url("/user/history"), [("user", user)])
            .map_err(|e| ServiceError::Malformed(format!("invalid history URL: {e}")))?;
        let request = self
            .raw_client()
            .get(url)
            .bearer_auth(credential.expose());
        self.send_json(request).await
    }
}

impl HttpBackend {
    /// Download an entry's stored media into `dir`.
    ///
    /// The storage URL is fetched without the session credential. An existing
    /// file of the same name is never overwritten; a numeric suffix is added
    /// instead. Returns the written path.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub async fn download_media(
        &self,
        entry: &HistoryEntry,
        dir: &Path,
    ) -> Result<PathBuf, ClientError> {
        let (Some(url), Some(file_name)) = (entry.storage_url.as_deref(), entry.download_file_name())
        else {
            return Err(ClientError::NoMedia);
        };

        let response = self.send(self.raw_client().get(url)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Malformed(format!("failed to read media body: {e}")))?;

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| ClientError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        let target = unique_path(dir, &file_name);
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|source| ClientError::Io {
                path: target.clone(),
                source,
            })?;

        tracing::info!(path = %target.display(), bytes = bytes.len(), "media downloaded");
        Ok(target)
    }
}

/// `dir/name`, or `dir/stem-N.ext` with the first free N.
fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem}-{n}.{ext}")),
            None => dir.join(format!("{stem}-{n}")),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
