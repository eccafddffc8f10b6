//! ragloop-agent
//!
//! Ingestion, prompt templates, the iterative retrieval loop and the
//! [`RagEngine`] facade tying providers, store and retriever together.

use std::sync::Arc;

use tracing::info;

use ragloop_core::config::{expand_path, RagConfig};
use ragloop_core::error::{Error, Result};
use ragloop_core::traits::{Completer, Embedder, VectorStore};
use ragloop_core::types::{Meta, RagAnswer, SearchResult, StoreStats};
use ragloop_embed::{get_default_completer, get_default_embedder};
use ragloop_vector::{LanceStore, Retriever};

pub mod ingest;
pub mod iterative;
pub mod prompt;

pub use ingest::{Ingestor, Progress};
pub use iterative::{IterativeRetrievalLoop, Termination};
pub use prompt::{gathered_context, PromptBuilder};

pub struct RagEngine {
    cfg: RagConfig,
    store: Arc<dyn VectorStore>,
    retriever: Arc<Retriever>,
    ingestor: Ingestor,
    agent: IterativeRetrievalLoop,
}

impl RagEngine {
    pub fn new(
        cfg: RagConfig,
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn Completer>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        let retriever = Arc::new(
            Retriever::new(Arc::clone(&embedder), Arc::clone(&store)).with_context_bonus(cfg.retrieval.context_bonus),
        );
        let ingestor = Ingestor::new(embedder, Arc::clone(&store), cfg.chunking.clone());
        let agent = IterativeRetrievalLoop::new(Arc::clone(&retriever), completer, cfg.agent.clone());
        Self { cfg, store, retriever, ingestor, agent }
    }

    /// Engine over the configured providers and LanceDB store.
    pub async fn from_config(cfg: RagConfig) -> Result<Self> {
        cfg.validate()?;
        let embedder = get_default_embedder(&cfg.provider)?;
        let completer = get_default_completer(&cfg.provider)?;
        let uri = expand_path(&cfg.store.uri);
        let uri = uri
            .to_str()
            .ok_or_else(|| Error::InvalidConfig(format!("store.uri is not valid UTF-8: {}", uri.display())))?;
        let store = Arc::new(LanceStore::open(uri, &cfg.store.table).await?);
        info!(endpoint = %cfg.provider.endpoint, model = embedder.model(), "engine ready");
        Ok(Self::new(cfg, embedder, completer, store))
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    pub async fn ingest(&self, doc_id: &str, content: &str, metadata: &Meta, progress: Option<Progress<'_>>) -> Result<usize> {
        self.ingestor.ingest(doc_id, content, metadata, progress).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.retriever.search_rag(query, self.cfg.retrieval.top_k).await
    }

    pub async fn search_with_context(&self, query: &str) -> Result<Vec<SearchResult>> {
        let r = &self.cfg.retrieval;
        self.retriever.search_with_context(query, r.top_k, r.context_window).await
    }

    pub async fn search_with_tokens(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.retriever.search_rag_with_tokens(query, self.cfg.retrieval.target_tokens).await
    }

    /// Iterative retrieval followed by a final answer.
    pub async fn query(&self, query: &str) -> Result<RagAnswer> {
        self.agent.run(query).await
    }

    pub async fn recursive_query(&self, query: &str, max_questions: usize) -> Result<RagAnswer> {
        self.agent.run_with_rounds(query, max_questions).await
    }

    pub async fn export_json(&self) -> Result<Vec<u8>> {
        ragloop_vector::export_json(self.store.as_ref()).await
    }

    pub async fn import_json(&self, json: &[u8]) -> Result<usize> {
        ragloop_vector::import_json(self.store.as_ref(), json).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await?;
        info!("store cleared");
        Ok(())
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        ragloop_vector::store_stats(self.store.as_ref()).await
    }

    /// Import the configured remote knowledge base, if any. Never fails.
    pub async fn bootstrap(&self) -> bool {
        match self.cfg.store.bootstrap_url.as_deref() {
            Some(url) => ragloop_vector::bootstrap_from_url(self.store.as_ref(), url).await,
            None => false,
        }
    }
}
