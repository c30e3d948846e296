use std::path::PathBuf;
use thiserror::Error;

use crate::types::SourceCategory;

/// Which enrichment task failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentKind {
    Financials,
    Qualitative,
}

impl std::fmt::Display for EnrichmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentKind::Financials => f.write_str("financial extraction"),
            EnrichmentKind::Qualitative => f.write_str("qualitative analysis"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{category} corpus directory missing at path: {}", path.display())]
    MissingCorpus { category: SourceCategory, path: PathBuf },

    #[error("no parseable documents found (reports: {}, transcripts: {})", reports.display(), transcripts.display())]
    EmptyCorpus { reports: PathBuf, transcripts: PathBuf },

    #[error("vector index initialization failed: {0:#}")]
    IndexInit(#[source] anyhow::Error),

    #[error("{kind} failed: {source:#}")]
    Enrichment {
        kind: EnrichmentKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("forecast synthesis failed: {0:#}")]
    Synthesis(#[source] anyhow::Error),

    #[error("task must not be empty")]
    InvalidTask,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("forecast output is not valid JSON for the expected schema: {0}")]
    MalformedForecast(String),
}

impl Error {
    /// Short label of the pipeline stage that produced the error.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::MissingCorpus { .. } | Error::EmptyCorpus { .. } => "corpus",
            Error::IndexInit(_) => "index",
            Error::Enrichment { .. } => "enrichment",
            Error::Synthesis(_) => "synthesis",
            Error::InvalidTask => "request",
            Error::InvalidConfig(_) => "config",
            Error::MalformedForecast(_) => "output",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
