//! Similarity scoring over scanned chunks.

use std::sync::Arc;

use ragloop_core::types::{Chunk, ChunkMetadata, SearchResult};

/// Cosine similarity of two vectors.
///
/// Undefined inputs (different lengths, empty, or a zero vector) give NaN;
/// callers drop NaN scores before ranking.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return f32::NAN;
    }
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    (dot / (na.sqrt() * nb.sqrt())) as f32
}

/// Ranking bonus for chunks with stored context on both sides.
pub fn context_bonus(metadata: &ChunkMetadata, bonus: f32) -> f32 {
    if metadata.has_full_context() {
        bonus
    } else {
        0.0
    }
}

/// Score every chunk against `query`, drop undefined scores and sort best
/// first. Equal scores keep scan order.
pub fn rank(chunks: &[Arc<Chunk>], query: &[f32], bonus: Option<f32>) -> Vec<SearchResult> {
    let mut scored: Vec<SearchResult> = chunks
        .iter()
        .filter_map(|c| {
            let cos = cosine_similarity(query, &c.embedding);
            if cos.is_nan() {
                return None;
            }
            let score = cos + bonus.map_or(0.0, |b| context_bonus(&c.metadata, b));
            Some(SearchResult::new(Arc::clone(c), score))
        })
        .collect();
    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, embedding: Vec<f32>, full_context: bool) -> Arc<Chunk> {
        let mut metadata = ChunkMetadata::new("d", 0);
        if full_context {
            metadata.preceding_context = "a".into();
            metadata.following_context = "b".into();
        }
        Arc::new(Chunk { id: id.into(), content: id.into(), embedding, metadata })
    }

    #[test]
    fn cosine_bounds() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn undefined_cosine_is_nan() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_nan());
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_nan());
        assert!(cosine_similarity(&[], &[]).is_nan());
    }

    #[test]
    fn bonus_lifts_interior_chunks() {
        let chunks = vec![chunk("edge", vec![1.0, 0.0], false), chunk("inner", vec![0.9, 0.1], true)];
        let plain = rank(&chunks, &[1.0, 0.0], None);
        assert_eq!(plain[0].id(), "edge");
        let boosted = rank(&chunks, &[1.0, 0.0], Some(0.2));
        assert_eq!(boosted[0].id(), "inner");
        assert!(boosted[0].similarity > 1.0);
    }

    #[test]
    fn nan_scores_are_dropped() {
        let chunks = vec![chunk("zero", vec![0.0, 0.0], true), chunk("short", vec![1.0], false), chunk("ok", vec![1.0, 1.0], false)];
        let ranked = rank(&chunks, &[1.0, 0.0], Some(0.2));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id(), "ok");
    }
}
