use async_trait::async_trait;
use std::path::Path;

use crate::types::{Document, MarketSnapshot, RetrievedChunk, SourceCategory};

pub trait Embedder: Send + Sync {
    /// Stable identifier for the model (e.g. `bert:all-MiniLM-L6-v2:d384`).
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    /// Returns one L2-normalised vector of length `dim()` per input text.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Reads one corpus directory into documents tagged with `category`.
pub trait DocumentLoader: Send + Sync {
    fn load_dir(&self, dir: &Path, category: SourceCategory) -> anyhow::Result<Vec<Document>>;
}

/// Similarity search restricted to a single source category.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Best matches first. An empty result is not an error.
    async fn retrieve(
        &self,
        query: &str,
        category: SourceCategory,
    ) -> anyhow::Result<Vec<RetrievedChunk>>;
}

/// Opaque text completion.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    fn model_id(&self) -> &str;
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self) -> anyhow::Result<MarketSnapshot>;
}
