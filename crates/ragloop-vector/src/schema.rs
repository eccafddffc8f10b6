//! Arrow layout of the chunk table and conversions to and from [`Chunk`].
//!
//! `doc_id` and `chunk_index` are duplicated out of the metadata JSON so they
//! can be filtered on; the JSON column stays the source of truth.

use std::sync::Arc;

use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};

use ragloop_core::error::{Error, Result};
use ragloop_core::types::{Chunk, ChunkMetadata};

pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("doc_id", DataType::Utf8, false),
        Field::new("chunk_index", DataType::Int32, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("metadata", DataType::Utf8, false),
        Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
    ]))
}

/// Pack chunks sharing one embedding length into a record batch.
pub fn chunks_to_record_batch(chunks: &[Chunk]) -> Result<RecordBatch> {
    let dim = chunks.first().map(|c| c.embedding.len()).unwrap_or_default();
    if dim == 0 {
        return Err(Error::Store("cannot store a chunk without an embedding".into()));
    }
    if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dim) {
        return Err(Error::Store(format!(
            "embedding of '{}' has {} dimensions, expected {dim}",
            bad.id,
            bad.embedding.len()
        )));
    }
    let dim = i32::try_from(dim).map_err(Error::store)?;

    let mut ids = Vec::with_capacity(chunks.len());
    let mut doc_ids = Vec::with_capacity(chunks.len());
    let mut indices = Vec::with_capacity(chunks.len());
    let mut contents = Vec::with_capacity(chunks.len());
    let mut metas = Vec::with_capacity(chunks.len());
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(chunks.len());
    for c in chunks {
        ids.push(c.id.clone());
        doc_ids.push(c.metadata.doc_id.clone());
        indices.push(i32::try_from(c.metadata.chunk_index).map_err(Error::store)?);
        contents.push(c.content.clone());
        metas.push(serde_json::to_string(&c.metadata)?);
        vectors.push(Some(c.embedding.iter().map(|&x| Some(x)).collect()));
    }

    RecordBatch::try_new(
        build_chunk_schema(dim),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(doc_ids)),
            Arc::new(Int32Array::from(indices)),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(metas)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim)),
        ],
    )
    .map_err(Error::store)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::Store(format!("{name} column missing")))
}

pub fn record_batch_to_chunks(batch: &RecordBatch) -> Result<Vec<Chunk>> {
    let ids = string_column(batch, "id")?;
    let contents = string_column(batch, "content")?;
    let metas = string_column(batch, "metadata")?;
    let vectors = batch
        .column_by_name("vector")
        .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
        .ok_or_else(|| Error::Store("vector column missing".into()))?;

    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let values = vectors.value(i);
        let floats = values
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| Error::Store("vector items are not f32".into()))?;
        let metadata: ChunkMetadata = serde_json::from_str(metas.value(i))?;
        out.push(Chunk {
            id: ids.value(i).to_string(),
            content: contents.value(i).to_string(),
            embedding: floats.values().to_vec(),
            metadata,
        });
    }
    Ok(out)
}
