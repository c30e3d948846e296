//! Build-or-load lifecycle for the persisted chunk index.
//!
//! An existing index at `index_path` is opened as-is and the corpora are not
//! touched, even if they changed since the build. Otherwise both corpora are
//! loaded, chunked, embedded and written, and the fresh index is returned.

use anyhow::anyhow;
use std::path::PathBuf;
use std::sync::Arc;

use fincast_core::config::{ChunkingConfig, Settings};
use fincast_core::data_processor::{load_corpora, DataProcessor};
use fincast_core::error::{Error, Result};
use fincast_core::traits::{DocumentLoader, Embedder};

use crate::schema::vector_dim;
use crate::search::VectorIndex;
use crate::table::{open_db, read_manifest, table_exists, write_manifest, IndexManifest};
use crate::writer::ChunkWriter;

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub reports_dir: PathBuf,
    pub transcripts_dir: PathBuf,
    pub index_path: PathBuf,
    pub table: String,
    pub chunking: ChunkingConfig,
    pub top_k: usize,
}

impl IndexOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            reports_dir: settings.corpus.reports_path(),
            transcripts_dir: settings.corpus.transcripts_path(),
            index_path: settings.index.db_path(),
            table: settings.index.table.clone(),
            chunking: settings.chunking.clone(),
            top_k: settings.retrieval.top_k,
        }
    }
}

pub async fn build_or_load(opts: &IndexOptions, loader: &dyn DocumentLoader, embedder: Arc<dyn Embedder>) -> Result<VectorIndex> {
    opts.chunking.validate()?;
    if opts.top_k == 0 {
        return Err(Error::InvalidConfig("top_k must be at least 1".into()));
    }

    if opts.index_path.exists() {
        let db = open_db(&opts.index_path).await.map_err(Error::IndexInit)?;
        if table_exists(&db, &opts.table).await.map_err(Error::IndexInit)? {
            tracing::info!("Existing index found at {}. Loading...", opts.index_path.display());
            return load(db, opts, embedder).await;
        }
        // A directory without the chunk table is the remains of an interrupted build.
        tracing::warn!("{} has no '{}' table; rebuilding from scratch", opts.index_path.display(), opts.table);
        drop(db);
        std::fs::remove_dir_all(&opts.index_path).map_err(|e| Error::IndexInit(e.into()))?;
    }

    tracing::info!("No index at {}. Creating a new one...", opts.index_path.display());
    build(opts, loader, embedder).await
}

async fn load(db: lancedb::Connection, opts: &IndexOptions, embedder: Arc<dyn Embedder>) -> Result<VectorIndex> {
    let table = db.open_table(&opts.table).execute().await.map_err(|e| Error::IndexInit(e.into()))?;
    let schema = table.schema().await.map_err(|e| Error::IndexInit(e.into()))?;
    let dim = vector_dim(&schema).ok_or_else(|| Error::IndexInit(anyhow!("table '{}' has no vector column", opts.table)))?;
    if usize::try_from(dim).ok() != Some(embedder.dim()) {
        return Err(Error::IndexInit(anyhow!(
            "index vectors have dimension {} but embedder '{}' produces {}",
            dim,
            embedder.embedder_id(),
            embedder.dim()
        )));
    }
    let manifest = match read_manifest(&db).await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("Ignoring unreadable index manifest: {:#}", e);
            None
        }
    };
    match &manifest {
        Some(m) if m.embedder_id != embedder.embedder_id() => tracing::warn!(
            "Index was built with '{}' but queries will use '{}'",
            m.embedder_id,
            embedder.embedder_id()
        ),
        Some(m) if m.chunk_size != opts.chunking.chunk_size || m.chunk_overlap != opts.chunking.chunk_overlap => tracing::warn!(
            "Index was chunked with {}/{} (size/overlap); current settings are {}/{}. Delete {} to rebuild.",
            m.chunk_size,
            m.chunk_overlap,
            opts.chunking.chunk_size,
            opts.chunking.chunk_overlap,
            opts.index_path.display()
        ),
        Some(_) => {}
        None => tracing::warn!("Index at {} has no manifest", opts.index_path.display()),
    }
    Ok(VectorIndex::new(db, table, embedder, opts.top_k, manifest))
}

async fn build(opts: &IndexOptions, loader: &dyn DocumentLoader, embedder: Arc<dyn Embedder>) -> Result<VectorIndex> {
    let documents = load_corpora(loader, &opts.reports_dir, &opts.transcripts_dir)?;
    tracing::info!("Loaded {} documents from Reports and Transcripts", documents.len());

    let processor = DataProcessor::new(opts.chunking.clone());
    let chunks = processor.chunk_documents(&documents);

    let db = open_db(&opts.index_path).await.map_err(Error::IndexInit)?;
    ChunkWriter::new(&db, &opts.table, Arc::clone(&embedder)).write(&chunks).await.map_err(Error::IndexInit)?;
    let manifest = IndexManifest {
        embedder_id: embedder.embedder_id().to_string(),
        dim: embedder.dim(),
        chunk_size: opts.chunking.chunk_size,
        chunk_overlap: opts.chunking.chunk_overlap,
        built_at: chrono::Utc::now().to_rfc3339(),
    };
    write_manifest(&db, &manifest).await.map_err(Error::IndexInit)?;
    tracing::info!("Index creation complete and persisted at {}", opts.index_path.display());

    let table = db.open_table(&opts.table).execute().await.map_err(|e| Error::IndexInit(e.into()))?;
    Ok(VectorIndex::new(db, table, embedder, opts.top_k, Some(manifest)))
}
