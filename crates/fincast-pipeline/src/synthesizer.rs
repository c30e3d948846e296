use std::time::Duration;

use fincast_core::error::{Error, Result};
use fincast_core::traits::CompletionModel;
use fincast_core::ForecastBundle;

use crate::llm::complete_with_timeout;
use crate::prompts::synthesis_prompt;

/// Turns an assembled bundle into the forecast text with one completion call.
///
/// The output is returned trimmed but otherwise untouched; callers that need
/// JSON should go through [`crate::output::parse_forecast`].
pub async fn synthesize(task: &str, bundle: ForecastBundle, llm: &dyn CompletionModel, timeout: Duration) -> Result<String> {
    let prompt = synthesis_prompt(task, &bundle.financials, &bundle.qualitative, &bundle.market);
    tracing::debug!(prompt_chars = prompt.len(), market_entries = bundle.market.len(), "synthesizing forecast");
    let raw = complete_with_timeout(llm, &prompt, timeout).await.map_err(|e| {
        tracing::error!("forecast synthesis failed: {:#}", e);
        Error::Synthesis(e)
    })?;
    Ok(raw.trim().to_string())
}
