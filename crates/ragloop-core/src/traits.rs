use async_trait::async_trait;

use crate::error::Result;
use crate::types::Chunk;

/// Turns text into a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Name of the embedding model, as the provider lists it.
    fn model(&self) -> &str;

    /// Verify the provider is reachable and serves [`Embedder::model`].
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Produces free text for a prompt.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Persistence for chunk records.
///
/// `scan_all` materializes every record on each call; callers must not rely
/// on any ordering unless the implementation documents one.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert, or overwrite the record with the same id.
    async fn put(&self, chunk: &Chunk) -> Result<()>;
    async fn scan_all(&self) -> Result<Vec<Chunk>>;
    async fn count(&self) -> Result<usize>;
    async fn clear(&self) -> Result<()>;

    async fn export_all(&self) -> Result<Vec<Chunk>> {
        self.scan_all().await
    }

    /// Upsert each record in turn; stops at the first failing write.
    async fn import_all(&self, chunks: &[Chunk]) -> Result<usize> {
        for chunk in chunks {
            self.put(chunk).await?;
        }
        Ok(chunks.len())
    }
}
