//! ragloop-text
//!
//! Pure text processing for ingestion: the heuristic token estimate, the
//! cascading chunker, markdown cleanup and per-chunk context metadata.

pub mod chunker;
pub mod enrich;
pub mod markdown;
pub mod tokens;

pub use chunker::{chunk_text, is_markdown, DEFAULT_MAX_TOKENS};
pub use enrich::{enrich_metadata, sentence_count, surroundings, Surroundings};
pub use markdown::sanitize_markdown;
pub use tokens::estimate_tokens;
