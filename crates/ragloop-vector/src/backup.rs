//! JSON backup, restore, remote bootstrap and size statistics.
//!
//! The backup format is a JSON array of `{id, content, embedding, metadata}`
//! records, the same shape remote bootstrap sources serve.

use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use ragloop_core::error::{Error, Result};
use ragloop_core::traits::VectorStore;
use ragloop_core::types::{Chunk, StoreStats};

const BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(60);

/// Every record of the store as a JSON array.
pub async fn export_json(store: &dyn VectorStore) -> Result<Vec<u8>> {
    let records = store.export_all().await?;
    info!(records = records.len(), "exported store");
    Ok(serde_json::to_vec(&records)?)
}

/// Upsert every record of a JSON array; returns how many were imported.
pub async fn import_json(store: &dyn VectorStore, json: &[u8]) -> Result<usize> {
    let records: Vec<Chunk> = serde_json::from_slice(json)?;
    let n = store.import_all(&records).await?;
    info!(records = n, "imported records");
    Ok(n)
}

/// Record count and total JSON size of the store.
pub async fn store_stats(store: &dyn VectorStore) -> Result<StoreStats> {
    let records = store.scan_all().await?;
    let mut bytes = 0usize;
    for r in &records {
        bytes += serde_json::to_vec(r)?.len();
    }
    Ok(StoreStats { count: records.len(), size_mb: bytes as f64 / (1024.0 * 1024.0) })
}

/// Best-effort import of a remote JSON array of records.
///
/// Returns whether anything was imported. Failures are logged and
/// swallowed; they never reach the caller.
pub async fn bootstrap_from_url(store: &dyn VectorStore, url: &str) -> bool {
    match fetch_and_import(store, url).await {
        Ok(n) => {
            info!(url, records = n, "bootstrapped store");
            true
        }
        Err(e) => {
            warn!(url, error = %e, "bootstrap skipped");
            false
        }
    }
}

async fn fetch_and_import(store: &dyn VectorStore, url: &str) -> Result<usize> {
    let http = Client::builder().timeout(BOOTSTRAP_TIMEOUT).build().map_err(Error::store)?;
    let resp = http.get(url).send().await.map_err(|e| Error::ProviderUnavailable(format!("{url}: {e}")))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::ProviderHttp { status: status.as_u16(), url: url.to_string() });
    }
    let body = resp.bytes().await.map_err(|e| Error::ProviderResponse(e.to_string()))?;
    import_json(store, &body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use ragloop_core::types::ChunkMetadata;

    fn chunk(i: usize) -> Chunk {
        Chunk { id: format!("d_{i}"), content: "x".repeat(10), embedding: vec![0.1, 0.2], metadata: ChunkMetadata::new("d", i) }
    }

    #[tokio::test]
    async fn stats_sum_record_sizes() {
        let store = MemoryStore::new();
        assert_eq!(store_stats(&store).await.unwrap(), StoreStats { count: 0, size_mb: 0.0 });

        store.import_all(&[chunk(0), chunk(1)]).await.unwrap();
        let one = serde_json::to_vec(&chunk(0)).unwrap().len() as f64;
        let stats = store_stats(&store).await.unwrap();
        assert_eq!(stats.count, 2);
        assert!((stats.size_mb - 2.0 * one / (1024.0 * 1024.0)).abs() < 1e-12);
    }

    #[tokio::test]
    async fn malformed_backup_is_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(import_json(&store, b"{not json").await, Err(Error::Serialization(_))));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unreachable_bootstrap_is_swallowed() {
        let store = MemoryStore::new();
        assert!(!bootstrap_from_url(&store, "http://127.0.0.1:1/knowledge_base.json").await);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
