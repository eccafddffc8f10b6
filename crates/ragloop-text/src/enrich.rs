//! Per-chunk metadata computed once at ingestion.

use once_cell::sync::Lazy;
use regex::Regex;

use ragloop_core::types::{ChunkMetadata, Meta};

pub const DEFAULT_CONTEXT_CHARS: usize = 200;

static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+\s+").expect("sentence regex"));

/// Text immediately around a chunk inside its source document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Surroundings {
    pub preceding: String,
    pub following: String,
}

/// Capture up to `max_chars` characters on each side of the first occurrence
/// of `chunk` in `document`, trimmed.
///
/// A chunk whose text repeats in the document is anchored to the first
/// occurrence, which may not be where it was cut from. A chunk not found
/// verbatim (whitespace rewritten by the chunker) gets no surroundings.
pub fn surroundings(document: &str, chunk: &str, max_chars: usize) -> Surroundings {
    let Some(at) = document.find(chunk) else {
        return Surroundings::default();
    };
    let before = &document[..at];
    let after = &document[at + chunk.len()..];

    let skip = before.chars().count().saturating_sub(max_chars);
    let preceding: String = before.chars().skip(skip).collect();
    let following: String = after.chars().take(max_chars).collect();
    Surroundings { preceding: preceding.trim().to_string(), following: following.trim().to_string() }
}

/// Pieces left after splitting on sentence punctuation followed by whitespace.
pub fn sentence_count(chunk: &str) -> usize {
    SENTENCE_SPLIT.split(chunk).count()
}

/// Build the metadata stored with chunk `index` of `doc_id`.
///
/// Caller fields in `extra` are carried over; the computed fields win on a
/// name clash.
pub fn enrich_metadata(
    chunk: &str,
    doc_id: &str,
    document: &str,
    index: usize,
    context_chars: usize,
    extra: &Meta,
    timestamp: i64,
) -> ChunkMetadata {
    let around = surroundings(document, chunk, context_chars);
    let mut extra = extra.clone();
    for reserved in ["docId", "chunkIndex", "sentenceCount", "precedingContext", "followingContext", "timestamp"] {
        extra.remove(reserved);
    }
    ChunkMetadata {
        doc_id: doc_id.to_string(),
        chunk_index: index,
        sentence_count: sentence_count(chunk),
        preceding_context: around.preceding,
        following_context: around.following,
        timestamp,
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn captures_both_sides() {
        let doc = "First part. Middle chunk here. Last part.";
        let s = surroundings(doc, "Middle chunk here.", 200);
        assert_eq!(s.preceding, "First part.");
        assert_eq!(s.following, "Last part.");
    }

    #[test]
    fn windows_are_bounded_by_chars() {
        let doc = format!("{}CHUNK{}", "é".repeat(300), "b".repeat(300));
        let s = surroundings(&doc, "CHUNK", 200);
        assert_eq!(s.preceding.chars().count(), 200);
        assert_eq!(s.following.chars().count(), 200);
    }

    #[test]
    fn edge_chunks_have_one_side() {
        let s = surroundings("head tail", "head", 200);
        assert!(s.preceding.is_empty());
        assert_eq!(s.following, "tail");
    }

    #[test]
    fn repeated_text_anchors_to_first_occurrence() {
        let s = surroundings("A dup B dup C", "dup", 200);
        assert_eq!(s.preceding, "A");
        assert_eq!(s.following, "B dup C");
    }

    #[test]
    fn missing_chunk_gets_nothing() {
        assert_eq!(surroundings("abc", "zzz", 200), Surroundings::default());
    }

    #[test]
    fn counts_sentences() {
        assert_eq!(sentence_count("One. Two! Three"), 3);
        assert_eq!(sentence_count("No punctuation"), 1);
    }

    #[test]
    fn metadata_keeps_caller_fields() {
        let extra: Meta = serde_json::from_value(json!({ "type": "md", "chunkIndex": 99 })).unwrap();
        let m = enrich_metadata("Middle.", "doc", "Start. Middle. End.", 1, 200, &extra, 42);
        assert_eq!(m.chunk_index, 1);
        assert_eq!(m.preceding_context, "Start.");
        assert_eq!(m.following_context, "End.");
        assert_eq!(m.timestamp, 42);
        assert_eq!(m.extra.get("type"), Some(&json!("md")));
        assert!(!m.extra.contains_key("chunkIndex"));
    }
}
