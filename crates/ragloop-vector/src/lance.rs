//! [`VectorStore`] backed by a LanceDB table.
//!
//! The table is created on the first write, when the embedding length is
//! known; an absent table reads as empty. Writes are upserts keyed on `id`.

use std::borrow::Cow;
use std::collections::HashMap;

use arrow_array::RecordBatchIterator;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::ExecutableQuery;
use lancedb::{Connection, Table};
use tokio::sync::Mutex;
use tracing::{debug, info};

use ragloop_core::error::{Error, Result};
use ragloop_core::traits::VectorStore;
use ragloop_core::types::Chunk;

use crate::schema::{chunks_to_record_batch, record_batch_to_chunks};
use crate::table::{open_db, open_existing};

pub struct LanceStore {
    db: Connection,
    table_name: String,
    // Serializes table creation so two first writes cannot both create it.
    create_lock: Mutex<()>,
}

impl LanceStore {
    pub async fn open(uri: &str, table_name: &str) -> Result<Self> {
        let db = open_db(uri).await?;
        info!(uri, table = table_name, "opened vector store");
        Ok(Self { db, table_name: table_name.to_string(), create_lock: Mutex::new(()) })
    }

    async fn table(&self) -> Result<Option<Table>> {
        open_existing(&self.db, &self.table_name).await
    }

    /// Upsert a batch of chunks sharing one embedding length.
    ///
    /// When an id repeats within the batch the last occurrence wins, matching
    /// a sequence of single puts.
    pub async fn put_batch(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let chunks = last_per_id(chunks);
        let chunks = chunks.as_ref();
        let batch = chunks_to_record_batch(chunks)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));

        let _guard = self.create_lock.lock().await;
        match self.table().await? {
            Some(t) => {
                let mut mi = t.merge_insert(&["id"]);
                mi.when_matched_update_all(None).when_not_matched_insert_all();
                let _ = mi.execute(reader).await.map_err(Error::store)?;
            }
            None => {
                self.db.create_table(&self.table_name, reader).execute().await.map_err(Error::store)?;
                info!(table = %self.table_name, dim = chunks[0].embedding.len(), "created chunk table");
            }
        }
        debug!(rows = chunks.len(), "upserted chunks");
        Ok(())
    }
}

// merge_insert and create_table both keep every source row, so a repeated id
// would otherwise land twice.
fn last_per_id(chunks: &[Chunk]) -> Cow<'_, [Chunk]> {
    let last: HashMap<&str, usize> = chunks.iter().enumerate().map(|(i, c)| (c.id.as_str(), i)).collect();
    if last.len() == chunks.len() {
        return Cow::Borrowed(chunks);
    }
    debug!(dropped = chunks.len() - last.len(), "collapsed repeated ids in batch");
    Cow::Owned(
        chunks
            .iter()
            .enumerate()
            .filter(|(i, c)| last.get(c.id.as_str()) == Some(i))
            .map(|(_, c)| c.clone())
            .collect(),
    )
}

#[async_trait]
impl VectorStore for LanceStore {
    async fn put(&self, chunk: &Chunk) -> Result<()> {
        self.put_batch(std::slice::from_ref(chunk)).await
    }

    async fn scan_all(&self) -> Result<Vec<Chunk>> {
        let Some(t) = self.table().await? else {
            return Ok(Vec::new());
        };
        let mut stream = t.query().execute().await.map_err(Error::store)?;
        let mut out = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(Error::store)? {
            out.extend(record_batch_to_chunks(&batch)?);
        }
        Ok(out)
    }

    async fn count(&self) -> Result<usize> {
        match self.table().await? {
            Some(t) => t.count_rows(None).await.map_err(Error::store),
            None => Ok(0),
        }
    }

    async fn clear(&self) -> Result<()> {
        if let Some(t) = self.table().await? {
            t.delete("true").await.map_err(Error::store)?;
            info!(table = %self.table_name, "cleared chunk table");
        }
        Ok(())
    }

    async fn import_all(&self, chunks: &[Chunk]) -> Result<usize> {
        self.put_batch(chunks).await?;
        Ok(chunks.len())
    }
}
