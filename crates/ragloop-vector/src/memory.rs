//! In-process [`VectorStore`]; records live until the process exits.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use ragloop_core::error::Result;
use ragloop_core::traits::VectorStore;
use ragloop_core::types::{Chunk, ChunkId};

/// Scans return records ordered by id.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<ChunkId, Chunk>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn put(&self, chunk: &Chunk) -> Result<()> {
        self.records.write().await.insert(chunk.id.clone(), chunk.clone());
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<Chunk>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }

    async fn clear(&self) -> Result<()> {
        self.records.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragloop_core::types::ChunkMetadata;

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk {
            id: id.into(),
            content: content.into(),
            embedding: vec![1.0],
            metadata: ChunkMetadata::new("d", 0),
        }
    }

    #[tokio::test]
    async fn same_id_overwrites() {
        let store = MemoryStore::new();
        store.put(&chunk("d_0", "old")).await.unwrap();
        store.put(&chunk("d_0", "new")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.scan_all().await.unwrap()[0].content, "new");
    }

    #[tokio::test]
    async fn clear_empties() {
        let store = MemoryStore::new();
        store.import_all(&[chunk("a", "x"), chunk("b", "y")]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
        store.clear().await.unwrap();
        assert!(store.scan_all().await.unwrap().is_empty());
    }
}
