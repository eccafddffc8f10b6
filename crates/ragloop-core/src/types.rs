//! Domain types shared by the segmenter, the stores, the retriever and the
//! iterative loop.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type ChunkId = String;

/// Free-form metadata supplied by the caller at ingestion (e.g. `type`).
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// Build the store key of a chunk: `{doc_id}_{chunk_index}`.
pub fn chunk_id(doc_id: &str, chunk_index: usize) -> ChunkId {
    format!("{doc_id}_{chunk_index}")
}

/// A persisted chunk record.
///
/// - `id`: `{doc_id}_{chunk_index}`, unique in the store (same id overwrites)
/// - `content`: raw chunk text as emitted by the segmenter
/// - `embedding`: vector from the embedding model; its length is fixed per store
/// - `metadata`: position, surrounding text and caller fields
///
/// Serialized field names follow the JSON backup format
/// (`{id, content, embedding, metadata: {docId, chunkIndex, ...}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    pub doc_id: String,
    pub chunk_index: usize,
    #[serde(default)]
    pub sentence_count: usize,
    /// Up to 200 characters of document text immediately before the chunk.
    #[serde(default)]
    pub preceding_context: String,
    /// Up to 200 characters of document text immediately after the chunk.
    #[serde(default)]
    pub following_context: String,
    /// Milliseconds since the Unix epoch at ingestion.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(flatten)]
    pub extra: Meta,
}

impl ChunkMetadata {
    pub fn new(doc_id: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            doc_id: doc_id.into(),
            chunk_index,
            sentence_count: 0,
            preceding_context: String::new(),
            following_context: String::new(),
            timestamp: 0,
            extra: Meta::new(),
        }
    }

    /// Interior chunks carry text on both sides; edge chunks miss one of them.
    pub fn has_full_context(&self) -> bool {
        !self.preceding_context.is_empty() && !self.following_context.is_empty()
    }
}

/// Sibling-chunk text joined around a windowed match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchContext {
    pub before: String,
    pub after: String,
}

/// A scored view over a stored chunk.
///
/// The chunk itself is shared, not copied; `content` is the display text,
/// which retrieval modes may stitch with surrounding context. The raw text
/// stays reachable through [`SearchResult::text`].
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Arc<Chunk>,
    /// Cosine similarity, plus the ranking bonus in modes that apply it.
    pub similarity: f32,
    pub content: String,
    pub context: Option<SearchContext>,
    pub tokens: Option<usize>,
}

impl SearchResult {
    pub fn new(chunk: Arc<Chunk>, similarity: f32) -> Self {
        let content = chunk.content.clone();
        Self { chunk, similarity, content, context: None, tokens: None }
    }

    pub fn id(&self) -> &str {
        &self.chunk.id
    }

    pub fn text(&self) -> &str {
        &self.chunk.content
    }

    pub fn metadata(&self) -> &ChunkMetadata {
        &self.chunk.metadata
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMatch {
    pub content: String,
    pub context: Option<SearchContext>,
    pub similarity: f32,
}

impl From<&SearchResult> for HistoryMatch {
    fn from(r: &SearchResult) -> Self {
        Self { content: r.content.clone(), context: r.context.clone(), similarity: r.similarity }
    }
}

/// One round of the iterative loop: the query that was searched and what it found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub question: String,
    pub matches: Vec<HistoryMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub content: String,
    pub context: Option<SearchContext>,
    pub similarity: f32,
    pub metadata: ChunkMetadata,
}

impl From<&SearchResult> for Source {
    fn from(r: &SearchResult) -> Self {
        Self {
            content: r.content.clone(),
            context: r.context.clone(),
            similarity: r.similarity,
            metadata: r.chunk.metadata.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RagAnswer {
    pub final_answer: String,
    pub search_history: Vec<SearchHistoryEntry>,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StoreStats {
    pub count: usize,
    /// Total JSON size of all records, in megabytes.
    pub size_mb: f64,
}
