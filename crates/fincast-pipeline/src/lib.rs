//! Forecast pipeline: two retrieval-augmented enrichment tasks and a market
//! snapshot fetched concurrently, then a single synthesis completion.

pub mod enrichment;
pub mod llm;
pub mod market;
pub mod orchestrator;
pub mod output;
pub mod prompts;
pub mod synthesizer;

pub use enrichment::{retrieve_context, EnrichmentTask};
pub use llm::ChatCompletionClient;
pub use market::{EmptyMarketSource, ScreenerSource, StaticMarketSource};
pub use orchestrator::{ForecastPipeline, PipelineOptions};
pub use output::{parse_forecast, strip_code_fences, Forecast};
pub use synthesizer::synthesize;

/// Task used when the caller does not supply one.
pub const DEFAULT_TASK: &str = "Analyze the financial reports and transcripts for the last three quarters and provide a qualitative forecast for the upcoming quarter. Your forecast must identify key financial trends (e.g., revenue growth, margin pressure), summarize management's stated outlook, and highlight any significant risks or opportunities mentioned";
