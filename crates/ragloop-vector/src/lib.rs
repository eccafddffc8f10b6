//! ragloop-vector
//!
//! Chunk persistence (LanceDB and in-memory), similarity scoring and the
//! three retrieval modes, plus JSON backup and remote bootstrap.

pub mod backup;
pub mod lance;
pub mod memory;
pub mod schema;
pub mod scoring;
pub mod search;
pub mod table;

pub use backup::{bootstrap_from_url, export_json, import_json, store_stats};
pub use lance::LanceStore;
pub use memory::MemoryStore;
pub use scoring::{context_bonus, cosine_similarity, rank};
pub use search::{stitch, Retriever};
