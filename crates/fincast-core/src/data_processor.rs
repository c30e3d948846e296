use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ChunkingConfig;
use crate::error::Error;
use crate::splitter::RecursiveSplitter;
use crate::traits::DocumentLoader;
use crate::types::{Document, DocumentChunk, SourceCategory};

/// Loads `.pdf`, `.txt` and `.md` files from a corpus directory (recursively).
///
/// Unreadable files are skipped with a warning, as are files with no text.
#[derive(Debug, Default, Clone)]
pub struct CorpusLoader;

impl CorpusLoader {
    pub fn new() -> Self { Self }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match extension(file_path).as_deref() {
            // pdf-extract panics on some malformed fonts; treat that as a parse failure.
            Some("pdf") => std::panic::catch_unwind(|| pdf_extract::extract_text(file_path))
                .map_err(|_| anyhow!("PDF parser panicked on {}", file_path.display()))?
                .map_err(|e| anyhow!("Failed to extract text from PDF {}: {}", file_path.display(), e)),
            _ => match fs::read_to_string(file_path) {
                Ok(content) => Ok(content),
                Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
            },
        }
    }

    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            if matches!(extension(path).as_deref(), Some("pdf" | "txt" | "md")) {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        files
    }
}

impl DocumentLoader for CorpusLoader {
    fn load_dir(&self, dir: &Path, category: SourceCategory) -> Result<Vec<Document>> {
        let files = self.list_files(dir);
        if files.is_empty() {
            tracing::warn!(dir = %dir.display(), %category, "no loadable files found");
            return Ok(vec![]);
        }
        let mut documents = Vec::with_capacity(files.len());
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!("Loading {} file {}/{}: {}", category, file_index + 1, files.len(), file_path.display());
            let content = match self.read_file_content(file_path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Skipping unreadable file {}: {:#}", file_path.display(), e);
                    continue;
                }
            };
            if content.trim().is_empty() {
                tracing::warn!("Skipping {} (no extractable text)", file_path.display());
                continue;
            }
            documents.push(Document { id: extract_doc_id(file_path), path: file_path.clone(), category, content });
        }
        tracing::info!("Loaded {} {} documents from {}", documents.len(), category, dir.display());
        Ok(documents)
    }
}

/// Loads both corpora, tagging each document with its category.
///
/// Both directories must exist, and together they must yield at least one document.
pub fn load_corpora(loader: &dyn DocumentLoader, reports: &Path, transcripts: &Path) -> crate::error::Result<Vec<Document>> {
    for (category, dir) in [(SourceCategory::Report, reports), (SourceCategory::Transcript, transcripts)] {
        if !dir.is_dir() {
            return Err(Error::MissingCorpus { category, path: dir.to_path_buf() });
        }
    }
    let mut documents = loader.load_dir(reports, SourceCategory::Report).map_err(Error::IndexInit)?;
    documents.extend(loader.load_dir(transcripts, SourceCategory::Transcript).map_err(Error::IndexInit)?);
    if documents.is_empty() {
        return Err(Error::EmptyCorpus { reports: reports.to_path_buf(), transcripts: transcripts.to_path_buf() });
    }
    Ok(documents)
}

#[derive(Debug, Clone)]
pub struct DataProcessor {
    splitter: RecursiveSplitter,
}

impl Default for DataProcessor {
    fn default() -> Self { Self::new(ChunkingConfig::default()) }
}

impl DataProcessor {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { splitter: RecursiveSplitter::new(config) }
    }

    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<DocumentChunk> {
        let mut all_chunks = Vec::new();
        for document in documents {
            all_chunks.extend(self.chunk_document(document));
        }
        tracing::info!("Split {} documents into {} chunks", documents.len(), all_chunks.len());
        all_chunks
    }

    pub fn chunk_document(&self, document: &Document) -> Vec<DocumentChunk> {
        let pieces = self.splitter.split(&document.content);
        let total_chunks = pieces.len();
        let doc_path = document.path.to_string_lossy().to_string();
        pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| DocumentChunk {
                id: format!("{}:{}:{}", document.category, document.id, chunk_index),
                doc_id: document.id.clone(),
                doc_path: doc_path.clone(),
                category: document.category,
                content,
                chunk_index,
                total_chunks,
            })
            .collect()
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|s| s.to_str()).map(|s| s.to_ascii_lowercase())
}

fn extract_doc_id(file_path: &Path) -> String {
    file_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.to_string_lossy().to_string())
}
