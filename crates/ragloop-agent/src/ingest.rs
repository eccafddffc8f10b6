//! Document ingestion: chunk, enrich, embed and store.
//!
//! Chunks are embedded and written one at a time, in order. The provider is
//! health-checked before any chunk is produced. A failing chunk aborts the
//! rest of the document; chunks already written stay in the store.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use ragloop_core::config::ChunkingConfig;
use ragloop_core::error::Result;
use ragloop_core::traits::{Embedder, VectorStore};
use ragloop_core::types::{chunk_id, Chunk, Meta};
use ragloop_text::{chunk_text, enrich_metadata, is_markdown, sanitize_markdown};

/// Called after each stored chunk with the percentage done and the document id.
pub type Progress<'a> = &'a (dyn Fn(f32, &str) + Send + Sync);

pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chunking: ChunkingConfig,
}

impl Ingestor {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, chunking: ChunkingConfig) -> Self {
        Self { embedder, store, chunking }
    }

    /// Ingest one document; returns the number of chunks stored.
    pub async fn ingest(&self, doc_id: &str, content: &str, metadata: &Meta, progress: Option<Progress<'_>>) -> Result<usize> {
        self.embedder.health_check().await?;

        let chunks = chunk_text(content, self.chunking.max_tokens, metadata);
        // Surroundings are looked up in the text the chunks were cut from.
        let source = if is_markdown(metadata) { sanitize_markdown(content) } else { content.to_string() };
        let total = chunks.len();
        info!(doc_id, chunks = total, "ingesting document");

        for (i, text) in chunks.into_iter().enumerate() {
            let embedding = self.embedder.embed(&text).await?;
            let meta = enrich_metadata(
                &text,
                doc_id,
                &source,
                i,
                self.chunking.context_chars,
                metadata,
                Utc::now().timestamp_millis(),
            );
            let chunk = Chunk { id: chunk_id(doc_id, i), content: text, embedding, metadata: meta };
            self.store.put(&chunk).await?;
            debug!(id = %chunk.id, "stored chunk");

            if let Some(report) = progress {
                report((i + 1) as f32 / total as f32 * 100.0, doc_id);
            }
        }
        Ok(total)
    }
}
