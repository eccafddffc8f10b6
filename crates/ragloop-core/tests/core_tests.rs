use std::fs;

use serde_json::json;
use tempfile::TempDir;

use ragloop_core::config::{resolve_with_base, Config, RagConfig};
use ragloop_core::types::{chunk_id, Chunk, ChunkMetadata};
use ragloop_core::Error;

#[test]
fn empty_environment_yields_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load_from(tmp.path(), "dev").expect("load");
    let rag = config.rag().expect("rag config");

    assert_eq!(rag.provider.endpoint, "http://localhost:11434");
    assert_eq!(rag.provider.embed_timeout_secs, 30);
    assert!(rag.provider.completion_timeout_secs.is_none());
    assert_eq!(rag.chunking.max_tokens, 250);
    assert_eq!(rag.retrieval.target_tokens, 8000);
    assert_eq!(rag.agent.max_questions, 5);
    assert_eq!(rag.agent.max_accumulated_chunks, 20);
}

#[test]
fn env_file_overrides_base_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[provider]\nembedding_model = \"nomic-embed-text\"\n[retrieval]\ntop_k = 7\n",
    )
    .unwrap();
    fs::write(tmp.path().join("config.test.toml"), "[retrieval]\ntop_k = 3\n").unwrap();

    let config = Config::load_from(tmp.path(), "test").expect("load");
    let rag = config.rag().expect("rag config");
    assert_eq!(rag.provider.embedding_model, "nomic-embed-text");
    assert_eq!(rag.retrieval.top_k, 3, "config.test.toml wins over config.toml");

    let k: usize = config.get("retrieval.top_k").expect("get");
    assert_eq!(k, 3);
}

#[test]
fn zero_budget_is_rejected() {
    let mut rag = RagConfig::default();
    rag.chunking.max_tokens = 0;
    assert!(matches!(rag.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn relative_paths_resolve_against_base() {
    let base = std::path::Path::new("/srv/rag");
    assert_eq!(resolve_with_base(base, "data/lancedb"), base.join("data/lancedb"));
    assert_eq!(resolve_with_base(base, "/abs/store"), std::path::PathBuf::from("/abs/store"));
}

#[test]
fn relative_store_uri_resolves_against_config_dir() {
    let tmp = TempDir::new().unwrap();
    let rag = Config::load_from(tmp.path(), "dev").unwrap().rag().unwrap();
    assert_eq!(std::path::PathBuf::from(&rag.store.uri), tmp.path().join("data/lancedb"));

    fs::write(tmp.path().join("config.toml"), "[store]\nuri = \"s3://bucket/rag\"\n").unwrap();
    let rag = Config::load_from(tmp.path(), "dev").unwrap().rag().unwrap();
    assert_eq!(rag.store.uri, "s3://bucket/rag");
}

#[test]
fn chunk_json_uses_backup_field_names() {
    let mut metadata = ChunkMetadata::new("guide", 2);
    metadata.preceding_context = "before".into();
    metadata.extra.insert("type".into(), json!("md"));
    let chunk = Chunk { id: chunk_id("guide", 2), content: "body".into(), embedding: vec![0.5, 0.25], metadata };

    let value = serde_json::to_value(&chunk).unwrap();
    assert_eq!(value["id"], "guide_2");
    assert_eq!(value["metadata"]["docId"], "guide");
    assert_eq!(value["metadata"]["chunkIndex"], 2);
    assert_eq!(value["metadata"]["precedingContext"], "before");
    assert_eq!(value["metadata"]["type"], "md", "caller fields are flattened into metadata");

    let back: Chunk = serde_json::from_value(value).unwrap();
    assert_eq!(back, chunk);
}

#[test]
fn records_without_enrichment_fields_still_parse() {
    let raw = json!({
        "id": "doc_0",
        "content": "hello",
        "embedding": [1.0, 0.0],
        "metadata": { "docId": "doc", "chunkIndex": 0, "timestamp": 1700000000000_i64 }
    });
    let chunk: Chunk = serde_json::from_value(raw).unwrap();
    assert_eq!(chunk.metadata.sentence_count, 0);
    assert!(chunk.metadata.preceding_context.is_empty());
    assert!(!chunk.metadata.has_full_context());
}
