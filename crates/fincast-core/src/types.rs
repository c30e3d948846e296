//! Domain types shared by the index and the forecasting pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub type ChunkId = String;

/// Ratio name -> display value, exactly as scraped. May be empty.
pub type MarketSnapshot = BTreeMap<String, String>;

/// Which corpus a document (and every chunk cut from it) belongs to.
///
/// The label is stored with each chunk and used as a hard retrieval filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    Report,
    Transcript,
}

impl SourceCategory {
    pub const ALL: [SourceCategory; 2] = [SourceCategory::Report, SourceCategory::Transcript];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceCategory::Report => "report",
            SourceCategory::Transcript => "transcript",
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" | "reports" => Ok(SourceCategory::Report),
            "transcript" | "transcripts" => Ok(SourceCategory::Transcript),
            other => Err(format!("unknown source category '{other}'")),
        }
    }
}

/// One loaded source file. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub path: PathBuf,
    pub category: SourceCategory,
    pub content: String,
}

/// A contiguous slice of a document's text; the atomic retrievable unit.
///
/// - `id`: `"{category}:{doc_id}:{chunk_index}"`
/// - `category`: inherited from the parent document
/// - `chunk_index`/`total_chunks`: position within the parent document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub doc_path: String,
    pub category: SourceCategory,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// A chunk returned by filtered similarity search.
///
/// `score` is `1 - cosine distance`; higher is always better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: ChunkId,
    pub category: SourceCategory,
    pub doc_path: String,
    pub content: String,
    pub score: f32,
}

/// Outputs of the fan-out phase, consumed once by the synthesizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForecastBundle {
    pub financials: String,
    pub qualitative: String,
    pub market: MarketSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips_through_labels() {
        for c in SourceCategory::ALL {
            assert_eq!(c.as_str().parse::<SourceCategory>().unwrap(), c);
        }
        assert_eq!("Reports".parse::<SourceCategory>().unwrap(), SourceCategory::Report);
        assert!("filings".parse::<SourceCategory>().is_err());
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&SourceCategory::Transcript).unwrap();
        assert_eq!(json, "\"transcript\"");
    }
}
