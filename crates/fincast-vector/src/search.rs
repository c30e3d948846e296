use anyhow::{anyhow, Result};
use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use std::sync::Arc;

use fincast_core::traits::{Embedder, Retriever};
use fincast_core::types::{RetrievedChunk, SourceCategory};

use crate::table::IndexManifest;

/// Read-only handle to a persisted chunk index.
///
/// Cheap to share behind an `Arc`; concurrent searches need no locking. There
/// is no write path: an index is only ever produced by `build_or_load`.
/// Dropping the last handle closes the underlying connection.
pub struct VectorIndex {
	_db: Connection,
	table: Table,
	embedder: Arc<dyn Embedder>,
	top_k: usize,
	manifest: Option<IndexManifest>,
}

impl VectorIndex {
	pub(crate) fn new(db: Connection, table: Table, embedder: Arc<dyn Embedder>, top_k: usize, manifest: Option<IndexManifest>) -> Self {
		Self { _db: db, table, embedder, top_k, manifest }
	}

	pub fn top_k(&self) -> usize { self.top_k }

	pub fn manifest(&self) -> Option<&IndexManifest> { self.manifest.as_ref() }

	pub fn table_name(&self) -> &str { self.table.name() }

	pub async fn count_rows(&self) -> Result<usize> {
		Ok(self.table.count_rows(None).await?)
	}

	/// Nearest chunks of one category, best first.
	pub async fn search(&self, query_text: &str, category: SourceCategory, limit: usize) -> Result<Vec<RetrievedChunk>> {
		let query_embedding = embed_query(Arc::clone(&self.embedder), query_text.to_string()).await?;
		let filter = format!("category = '{}'", category.as_str());
		let batches: Vec<RecordBatch> = self.table
			.vector_search(query_embedding)?
			.distance_type(DistanceType::Cosine)
			.only_if(filter)
			.limit(limit)
			.execute()
			.await?
			.try_collect()
			.await?;
		let mut hits = Vec::new();
		for batch in &batches {
			let ids = string_col(batch, "id")?;
			let categories = string_col(batch, "category")?;
			let paths = string_col(batch, "doc_path")?;
			let contents = string_col(batch, "content")?;
			let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());
			for i in 0..batch.num_rows() {
				let row_category: SourceCategory = categories.value(i).parse().map_err(|e: String| anyhow!(e))?;
				// The predicate already guarantees this; a mismatch means a corrupt index.
				if row_category != category {
					return Err(anyhow!("index returned a {} chunk for a {} query", row_category, category));
				}
				let distance = distances.filter(|d| d.is_valid(i)).map(|d| d.value(i)).unwrap_or(1.0);
				hits.push(RetrievedChunk {
					id: ids.value(i).to_string(),
					category: row_category,
					doc_path: paths.value(i).to_string(),
					content: contents.value(i).to_string(),
					score: 1.0 - distance,
				});
			}
		}
		hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(limit);
		tracing::debug!(%category, hits = hits.len(), "filtered vector search");
		Ok(hits)
	}
}

#[async_trait]
impl Retriever for VectorIndex {
	async fn retrieve(&self, query: &str, category: SourceCategory) -> Result<Vec<RetrievedChunk>> {
		self.search(query, category, self.top_k).await
	}
}

/// Runs the embedder on the blocking pool so concurrent searches do not stall the runtime.
async fn embed_query(embedder: Arc<dyn Embedder>, text: String) -> Result<Vec<f32>> {
	tokio::task::spawn_blocking(move || embedder.embed_batch(&[text]))
		.await
		.map_err(|e| anyhow!("query embedding task failed: {e}"))??
		.into_iter()
		.next()
		.ok_or_else(|| anyhow!("embedder returned no vector for query"))
}

fn string_col<'b>(batch: &'b RecordBatch, name: &str) -> Result<&'b StringArray> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| anyhow!("column '{}' missing from search results", name))
}
