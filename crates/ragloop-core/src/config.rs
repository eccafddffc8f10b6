//! Layered configuration and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_PROVIDER__ENDPOINT`). The typed
//! [`RagConfig`] is extracted from the merged layers; every field has a
//! default so an empty environment still yields a usable engine.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Hard ceiling on the number of rounds of the iterative loop.
pub const MAX_ROUNDS: usize = 10;

pub struct Config {
    figment: Figment,
    base: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(Path::new("."), &env_name)
    }

    /// Merge the config files found in `dir` for `env_name`, then `APP_*` vars.
    pub fn load_from(dir: &Path, env_name: &str) -> Result<Self> {
        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        let env_file = match env_name {
            "dev" | "development" => Some("config.dev.toml"),
            "prod" | "production" => Some("config.prod.toml"),
            "test" | "testing" => Some("config.test.toml"),
            _ => None,
        };
        if let Some(file) = env_file {
            figment = figment.merge(Toml::file(dir.join(file)));
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment, base: Some(dir.to_path_buf()) })
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment, base: None }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// Extract and validate the engine settings.
    ///
    /// A relative filesystem `store.uri` is resolved against the directory the
    /// config files were loaded from; URL-style URIs are left untouched.
    pub fn rag(&self) -> Result<RagConfig> {
        let mut cfg: RagConfig = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        if let Some(base) = &self.base {
            if !cfg.store.uri.contains("://") {
                cfg.store.uri = resolve_with_base(base, &cfg.store.uri).to_string_lossy().into_owned();
            }
        }
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub provider: ProviderConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub agent: AgentConfig,
    pub store: StoreConfig,
}

impl RagConfig {
    pub fn validate(&self) -> Result<()> {
        let p = &self.provider;
        if p.endpoint.trim().is_empty() {
            return Err(Error::InvalidConfig("provider.endpoint is empty".into()));
        }
        if p.embedding_model.trim().is_empty() || p.completion_model.trim().is_empty() {
            return Err(Error::InvalidConfig("provider model names must be set".into()));
        }
        if p.embed_timeout_secs == 0 {
            return Err(Error::InvalidConfig("provider.embed_timeout_secs must be > 0".into()));
        }
        if self.chunking.max_tokens == 0 {
            return Err(Error::InvalidConfig("chunking.max_tokens must be >= 1".into()));
        }
        if self.retrieval.top_k == 0 || self.agent.round_top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be >= 1".into()));
        }
        if self.agent.max_questions == 0 {
            return Err(Error::InvalidConfig("agent.max_questions must be >= 1".into()));
        }
        if self.store.table.trim().is_empty() {
            return Err(Error::InvalidConfig("store.table is empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub embedding_model: String,
    pub completion_model: String,
    pub embed_timeout_secs: u64,
    /// Completions run without a deadline unless this is set.
    pub completion_timeout_secs: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            embedding_model: "granite-embedding:30m".to_string(),
            completion_model: "llama3.2:latest".to_string(),
            embed_timeout_secs: 30,
            completion_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Token budget per chunk at ingestion.
    pub max_tokens: usize,
    /// Characters captured on each side of a chunk as surrounding context.
    pub context_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_tokens: 250, context_chars: 200 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub context_window: usize,
    pub target_tokens: usize,
    /// Added to the cosine score of chunks with context on both sides.
    pub context_bonus: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5, context_window: 2, target_tokens: 8000, context_bonus: 0.2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_questions: usize,
    /// The loop stops once strictly more matches than this were gathered.
    pub max_accumulated_chunks: usize,
    pub round_top_k: usize,
    pub round_context_window: usize,
    /// Embedded in the answer prompt when no context was gathered.
    pub default_context: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_questions: 5,
            max_accumulated_chunks: 20,
            round_top_k: 5,
            round_context_window: 2,
            default_context: "No relevant documents were found in the knowledge base.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub uri: String,
    pub table: String,
    /// Remote JSON array of records imported by `bootstrap`, if set.
    pub bootstrap_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { uri: "data/lancedb".to_string(), table: "embeddings".to_string(), bootstrap_url: None }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
