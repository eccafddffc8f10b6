//! HTTP client for an Ollama-compatible model server.
//!
//! Embedding calls are bounded by a deadline; on expiry the in-flight request
//! is dropped and [`Error::ProviderTimeout`] is returned. Completions have no
//! deadline unless `completion_timeout_secs` is configured.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ragloop_core::config::ProviderConfig;
use ragloop_core::error::{Error, Result};
use ragloop_core::traits::{Completer, Embedder};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

pub struct OllamaClient {
    http: Client,
    endpoint: String,
    embedding_model: String,
    completion_model: String,
    embed_timeout: Duration,
    completion_timeout: Option<Duration>,
}

impl OllamaClient {
    pub fn new(cfg: &ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            embedding_model: cfg.embedding_model.clone(),
            completion_model: cfg.completion_model.clone(),
            embed_timeout: Duration::from_secs(cfg.embed_timeout_secs),
            completion_timeout: cfg.completion_timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn with_embed_timeout(mut self, deadline: Duration) -> Self {
        self.embed_timeout = deadline;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// Names of the models the server has pulled.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = self.url("/api/tags");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::ProviderUnavailable(format!("{url}: {e}")))?;
        if !resp.status().is_success() {
            return Err(Error::ProviderUnavailable(format!("{url} responded with status {}", resp.status())));
        }
        let tags: TagsResponse = resp.json().await.map_err(|e| Error::ProviderResponse(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::ProviderUnavailable(format!("{url}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::ProviderHttp { status: status.as_u16(), url });
        }
        resp.json::<R>().await.map_err(|e| Error::ProviderResponse(e.to_string()))
    }
}

async fn with_deadline<T, F>(after: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| Error::ProviderTimeout { after })?
}

#[async_trait]
impl Embedder for OllamaClient {
    fn model(&self) -> &str {
        &self.embedding_model
    }

    async fn health_check(&self) -> Result<()> {
        let models = self.list_models().await?;
        if models.iter().any(|m| m.eq_ignore_ascii_case(&self.embedding_model)) {
            Ok(())
        } else {
            Err(Error::ProviderModelMissing { model: self.embedding_model.clone() })
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest { model: &self.embedding_model, prompt: text };
        let res: EmbeddingResponse =
            with_deadline(self.embed_timeout, self.post_json("/api/embeddings", &body)).await?;
        if res.embedding.is_empty() {
            return Err(Error::ProviderResponse("empty embedding".into()));
        }
        debug!(dim = res.embedding.len(), chars = text.len(), "embedded text");
        Ok(res.embedding)
    }
}

#[async_trait]
impl Completer for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest { model: &self.completion_model, prompt, stream: false };
        let call = self.post_json::<_, GenerateResponse>("/api/generate", &body);
        let res = match self.completion_timeout {
            Some(after) => with_deadline(after, call).await?,
            None => call.await?,
        };
        Ok(res.response)
    }
}
