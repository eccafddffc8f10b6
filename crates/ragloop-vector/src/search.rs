//! Brute-force retrieval over a full store scan.
//!
//! Three modes share the scan but differ in scoring and shaping:
//! - [`Retriever::search_rag`]: cosine plus context bonus, top K, stitched display text
//! - [`Retriever::search_with_context`]: raw cosine, top K, sibling-chunk window per match
//! - [`Retriever::search_rag_with_tokens`]: cosine plus bonus, greedily packed into a token budget

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use ragloop_core::config::RetrievalConfig;
use ragloop_core::error::Result;
use ragloop_core::traits::{Embedder, VectorStore};
use ragloop_core::types::{Chunk, SearchContext, SearchResult};
use ragloop_text::estimate_tokens;

use crate::scoring::rank;

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    context_bonus: f32,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store, context_bonus: RetrievalConfig::default().context_bonus }
    }

    pub fn with_context_bonus(mut self, bonus: f32) -> Self {
        self.context_bonus = bonus;
        self
    }

    async fn scan_and_rank(&self, query: &str, with_bonus: bool) -> Result<(Vec<Arc<Chunk>>, Vec<SearchResult>)> {
        let query_vec = self.embedder.embed(query).await?;
        let chunks: Vec<Arc<Chunk>> = self.store.scan_all().await?.into_iter().map(Arc::new).collect();
        let bonus = with_bonus.then_some(self.context_bonus);
        let ranked = rank(&chunks, &query_vec, bonus);
        debug!(scanned = chunks.len(), scored = ranked.len(), "ranked chunks");
        Ok((chunks, ranked))
    }

    /// Best `top_k` chunks by cosine plus context bonus.
    pub async fn search_rag(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let (_, ranked) = self.scan_and_rank(query, true).await?;
        Ok(ranked
            .into_iter()
            .take(top_k)
            .map(|mut r| {
                r.content = stitch(&r.chunk);
                r
            })
            .collect())
    }

    /// Best `top_k` chunks by raw cosine, each with up to `window` sibling
    /// chunks of its document on either side.
    pub async fn search_with_context(&self, query: &str, top_k: usize, window: usize) -> Result<Vec<SearchResult>> {
        let (chunks, ranked) = self.scan_and_rank(query, false).await?;

        let mut by_doc: HashMap<&str, Vec<&Chunk>> = HashMap::new();
        for c in &chunks {
            by_doc.entry(c.metadata.doc_id.as_str()).or_default().push(c);
        }
        for siblings in by_doc.values_mut() {
            siblings.sort_by_key(|c| c.metadata.chunk_index);
        }

        let mut out = Vec::with_capacity(top_k.min(ranked.len()));
        for mut r in ranked.into_iter().take(top_k) {
            let context = by_doc
                .get(r.chunk.metadata.doc_id.as_str())
                .and_then(|siblings| sibling_window(siblings, &r.chunk.id, window))
                .unwrap_or_default();
            r.context = Some(context);
            out.push(r);
        }
        Ok(out)
    }

    /// Chunks in score order whose raw token estimates fit `target_tokens`.
    ///
    /// A chunk that does not fit is skipped and packing continues with the
    /// next one; packing stops once the budget is exactly reached.
    pub async fn search_rag_with_tokens(&self, query: &str, target_tokens: usize) -> Result<Vec<SearchResult>> {
        if target_tokens == 0 {
            return Ok(Vec::new());
        }
        let (_, ranked) = self.scan_and_rank(query, true).await?;

        let mut total = 0usize;
        let mut out = Vec::new();
        for mut r in ranked {
            let tokens = estimate_tokens(r.text());
            if total + tokens <= target_tokens {
                total += tokens;
                r.content = stitch(&r.chunk);
                r.tokens = Some(tokens);
                out.push(r);
            }
            if total >= target_tokens {
                break;
            }
        }
        debug!(selected = out.len(), total, target_tokens, "packed chunks into token budget");
        Ok(out)
    }
}

/// Display text: stored preceding and following context around the chunk,
/// or the raw chunk when nothing precedes it.
pub fn stitch(chunk: &Chunk) -> String {
    let m = &chunk.metadata;
    if m.preceding_context.is_empty() {
        return chunk.content.clone();
    }
    format!("{}\n\n{}\n\n{}", m.preceding_context, chunk.content, m.following_context)
        .trim()
        .to_string()
}

fn sibling_window(siblings: &[&Chunk], id: &str, window: usize) -> Option<SearchContext> {
    let pos = siblings.iter().position(|c| c.id == id)?;
    let start = pos.saturating_sub(window);
    let end = (pos + window + 1).min(siblings.len());
    let join = |part: &[&Chunk]| part.iter().map(|c| c.content.as_str()).collect::<Vec<_>>().join("\n");
    Some(SearchContext { before: join(&siblings[start..pos]), after: join(&siblings[pos + 1..end]) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragloop_core::types::ChunkMetadata;

    fn chunk(doc: &str, idx: usize) -> Chunk {
        Chunk {
            id: format!("{doc}_{idx}"),
            content: format!("{doc} part {idx}"),
            embedding: vec![1.0],
            metadata: ChunkMetadata::new(doc, idx),
        }
    }

    #[test]
    fn window_is_clamped_to_document() {
        let chunks: Vec<Chunk> = (0..4).map(|i| chunk("d", i)).collect();
        let refs: Vec<&Chunk> = chunks.iter().collect();

        let ctx = sibling_window(&refs, "d_1", 2).unwrap();
        assert_eq!(ctx.before, "d part 0");
        assert_eq!(ctx.after, "d part 2\nd part 3");

        let ctx = sibling_window(&refs, "d_3", 1).unwrap();
        assert_eq!(ctx.before, "d part 2");
        assert!(ctx.after.is_empty());
    }

    #[test]
    fn zero_window_has_no_context() {
        let chunks: Vec<Chunk> = (0..3).map(|i| chunk("d", i)).collect();
        let refs: Vec<&Chunk> = chunks.iter().collect();
        assert_eq!(sibling_window(&refs, "d_1", 0).unwrap(), SearchContext::default());
    }

    #[test]
    fn stitch_needs_preceding_context() {
        let mut c = chunk("d", 0);
        c.metadata.following_context = "after".into();
        assert_eq!(stitch(&c), "d part 0");

        c.metadata.preceding_context = "before".into();
        assert_eq!(stitch(&c), "before\n\nd part 0\n\nafter");

        c.metadata.following_context.clear();
        assert_eq!(stitch(&c), "before\n\nd part 0");
    }
}
