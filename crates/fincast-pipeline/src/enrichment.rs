//! Retrieval-augmented enrichment tasks.
//!
//! Each task retrieves context from its own corpus, renders its instruction
//! template and makes exactly one completion call.

use std::time::Duration;

use fincast_core::error::{EnrichmentKind, Error, Result};
use fincast_core::traits::{CompletionModel, Retriever};
use fincast_core::SourceCategory;

use crate::llm::complete_with_timeout;
use crate::prompts;

/// Joins the retrieved chunks, best match first, separated by a blank line.
///
/// No matches yield an empty string.
pub async fn retrieve_context(retriever: &dyn Retriever, query: &str, category: SourceCategory) -> anyhow::Result<String> {
    let chunks = retriever.retrieve(query, category).await?;
    tracing::debug!(%category, hits = chunks.len(), "retrieved context");
    Ok(chunks.into_iter().map(|c| c.content).collect::<Vec<_>>().join("\n\n"))
}

#[derive(Debug, Clone, Copy)]
pub struct EnrichmentTask {
    kind: EnrichmentKind,
    category: SourceCategory,
    query: fn(&str) -> String,
    prompt: fn(&str, &str) -> String,
}

impl EnrichmentTask {
    /// Extracts forecastable metrics from the quarterly reports.
    pub const FINANCIAL_EXTRACTOR: EnrichmentTask = EnrichmentTask {
        kind: EnrichmentKind::Financials,
        category: SourceCategory::Report,
        query: prompts::financial_query,
        prompt: prompts::financial_prompt,
    };

    /// Summarises themes, sentiment and guidance from the earnings calls.
    pub const QUALITATIVE_ANALYZER: EnrichmentTask = EnrichmentTask {
        kind: EnrichmentKind::Qualitative,
        category: SourceCategory::Transcript,
        query: prompts::qualitative_query,
        prompt: prompts::qualitative_prompt,
    };

    pub fn query_for(&self, task: &str) -> String {
        (self.query)(task)
    }

    /// Returns the trimmed completion text. Not retried on failure.
    ///
    /// `timeout` bounds the retrieval and the completion separately.
    pub async fn run(&self, task: &str, llm: &dyn CompletionModel, retriever: &dyn Retriever, timeout: Duration) -> Result<String> {
        let wrap = |source: anyhow::Error| {
            tracing::error!("{} failed: {:#}", self.kind, source);
            Error::Enrichment { kind: self.kind, source }
        };
        let query = self.query_for(task);
        let context = match tokio::time::timeout(timeout, retrieve_context(retriever, &query, self.category)).await {
            Ok(result) => result.map_err(wrap)?,
            Err(_) => return Err(wrap(anyhow::anyhow!("{} retrieval timed out after {:?}", self.category, timeout))),
        };
        let prompt = (self.prompt)(&context, task);
        tracing::debug!(kind = %self.kind, context_chars = context.len(), prompt_chars = prompt.len(), "running enrichment");
        let output = complete_with_timeout(llm, &prompt, timeout).await.map_err(wrap)?;
        Ok(output.trim().to_string())
    }
}
