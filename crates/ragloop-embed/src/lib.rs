//! ragloop-embed
//!
//! Model-provider clients: the Ollama-compatible HTTP client used in
//! production and deterministic fakes for development and tests.

use std::sync::Arc;

use tracing::info;

use ragloop_core::config::ProviderConfig;
use ragloop_core::error::Result;
use ragloop_core::traits::{Completer, Embedder};

pub mod fake;
pub mod ollama;

pub use fake::{FakeEmbedder, ScriptedCompleter, FAKE_DIM};
pub use ollama::OllamaClient;

/// `APP_USE_FAKE_EMBEDDINGS=1|true` swaps the model server for the fakes.
pub fn use_fake_providers() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn get_default_embedder(cfg: &ProviderConfig) -> Result<Arc<dyn Embedder>> {
    if use_fake_providers() {
        info!("using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::default()));
    }
    Ok(Arc::new(OllamaClient::new(cfg)?))
}

pub fn get_default_completer(cfg: &ProviderConfig) -> Result<Arc<dyn Completer>> {
    if use_fake_providers() {
        info!("using ScriptedCompleter");
        return Ok(Arc::new(ScriptedCompleter::default()));
    }
    Ok(Arc::new(OllamaClient::new(cfg)?))
}
