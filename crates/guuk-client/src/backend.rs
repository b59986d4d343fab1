//! HTTP backend shared by every collaborator implementation.

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use guuk_core::session::Credential;
use guuk_core::ServiceError;

use crate::config::GuukConfig;
use crate::error::{self, ClientError};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Talks to the guuk API over HTTP. Implements the authentication, quiz,
/// generation and history collaborator traits.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|_| ClientError::InvalidBaseUrl(base_url.clone()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            base_url,
            timeout_secs,
            client,
        })
    }

    pub fn from_config(config: &GuukConfig) -> Result<Self, ClientError> {
        Self::new(&config.api_base_url, config.timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `path` with `segment` appended as a single percent-encoded path
    /// segment, so reserved characters in ids stay part of the id.
    pub(crate) fn url_with_segment(
        &self,
        path: &str,
        segment: &str,
    ) -> Result<reqwest::Url, ServiceError> {
        let mut url = reqwest::Url::parse(&self.url(path))
            .map_err(|e| ServiceError::Malformed(format!("invalid URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ServiceError::Malformed(format!("cannot extend URL {path}")))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    pub(crate) fn get_request(&self, path: &str, credential: &Credential) -> RequestBuilder {
        self.client
            .get(self.url(path))
            .bearer_auth(credential.expose())
    }

    pub(crate) fn post_request(&self, path: &str, credential: Option<&Credential>) -> RequestBuilder {
        let req = self.client.post(self.url(path));
        match credential {
            Some(c) => req.bearer_auth(c.expose()),
            None => req,
        }
    }

    pub(crate) fn raw_client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send a request, turning transport failures and error statuses into
    /// `ServiceError`s.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, ServiceError> {
        let response = request
            .send()
            .await
            .map_err(|e| error::transport(e, self.timeout_secs))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status, "service rejected request");
            return Err(error::rejection(status, &body));
        }
        Ok(response)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ServiceError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ServiceError::Malformed(format!("failed to parse response: {e}")))
    }
}
