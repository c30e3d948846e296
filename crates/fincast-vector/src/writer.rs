use anyhow::{anyhow, Result};
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::sync::Arc;

use fincast_core::traits::Embedder;
use fincast_core::types::DocumentChunk;

use crate::schema::build_chunk_schema;

const EMBED_BATCH: usize = 64;
const WRITE_BATCH: usize = 1000;

/// Embeds chunks and writes them to a new chunk table in one commit.
///
/// Rows are only visible once every chunk has been embedded, so a failed build
/// never leaves a half-populated table behind.
pub struct ChunkWriter<'a> { db: &'a Connection, table_name: String, embedder: Arc<dyn Embedder> }

impl<'a> ChunkWriter<'a> {
	pub fn new(db: &'a Connection, table_name: &str, embedder: Arc<dyn Embedder>) -> Self {
		Self { db, table_name: table_name.to_string(), embedder }
	}

	/// Embeds every chunk on the blocking pool, in order.
	pub async fn embed_all(&self, chunks: &[DocumentChunk]) -> Result<Vec<Vec<f32>>> {
		let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
		let embedder = Arc::clone(&self.embedder);
		tokio::task::spawn_blocking(move || embed_texts(embedder.as_ref(), &texts))
			.await
			.map_err(|e| anyhow!("embedding task failed: {e}"))?
	}

	pub async fn write(&self, chunks: &[DocumentChunk]) -> Result<usize> {
		if chunks.is_empty() { return Err(anyhow!("no chunks to index")); }
		let embeddings = self.embed_all(chunks).await?;
		let dim = i32::try_from(self.embedder.dim())?;
		let schema = build_chunk_schema(dim);
		let mut batches = Vec::new();
		for (docs, vecs) in chunks.chunks(WRITE_BATCH).zip(embeddings.chunks(WRITE_BATCH)) {
			batches.push(Ok(chunks_to_record_batch(docs, vecs, dim)?));
		}
		let reader = Box::new(RecordBatchIterator::new(batches.into_iter(), schema));
		self.db.create_table(&self.table_name, reader).execute().await?;
		tracing::info!("Indexed {} chunks into table '{}'", chunks.len(), self.table_name);
		Ok(chunks.len())
	}
}

fn embed_texts(embedder: &dyn Embedder, texts: &[String]) -> Result<Vec<Vec<f32>>> {
	let pb = ProgressBar::new(texts.len() as u64);
	pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?.progress_chars("#>-"));
	let mut embeddings = Vec::with_capacity(texts.len());
	for batch in texts.chunks(EMBED_BATCH) {
		let vectors = embedder.embed_batch(batch)?;
		if vectors.len() != batch.len() { return Err(anyhow!("embedder returned {} vectors for {} chunks", vectors.len(), batch.len())); }
		if let Some(bad) = vectors.iter().find(|v| v.len() != embedder.dim()) {
			return Err(anyhow!("dim mismatch: got {} expected {}", bad.len(), embedder.dim()));
		}
		embeddings.extend(vectors);
		pb.inc(batch.len() as u64);
	}
	pb.finish_with_message("embedded");
	Ok(embeddings)
}

fn chunks_to_record_batch(docs: &[DocumentChunk], vectors: &[Vec<f32>], dim: i32) -> Result<RecordBatch> {
	let schema = build_chunk_schema(dim);
	let mut ids = Vec::new(); let mut doc_ids = Vec::new(); let mut doc_paths = Vec::new(); let mut categories = Vec::new(); let mut contents = Vec::new(); let mut chunk_indices = Vec::new(); let mut total_chunks = Vec::new();
	for doc in docs { ids.push(doc.id.clone()); doc_ids.push(doc.doc_id.clone()); doc_paths.push(doc.doc_path.clone()); categories.push(doc.category.as_str().to_string()); contents.push(doc.content.clone()); chunk_indices.push(i32::try_from(doc.chunk_index)?); total_chunks.push(i32::try_from(doc.total_chunks)?); }
	let vector_values: Vec<Option<Vec<Option<f32>>>> = vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect())).collect();
	let record_batch = RecordBatch::try_new(schema, vec![
		Arc::new(StringArray::from(ids)),
		Arc::new(StringArray::from(doc_ids)),
		Arc::new(StringArray::from(doc_paths)),
		Arc::new(StringArray::from(categories)),
		Arc::new(StringArray::from(contents)),
		Arc::new(Int32Array::from(chunk_indices)),
		Arc::new(Int32Array::from(total_chunks)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vector_values.into_iter(), dim)),
	])?;
	Ok(record_batch)
}
