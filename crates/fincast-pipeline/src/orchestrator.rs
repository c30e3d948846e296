//! Parallel orchestration of one forecast request.
//!
//! Resources (index, completion model, market source) are constructed once and
//! injected; the pipeline holds them behind `Arc`s and never mutates them.
//! Dropping the pipeline releases the index connection and HTTP clients.

use std::sync::Arc;
use std::time::Duration;

use fincast_core::config::Settings;
use fincast_core::data_processor::CorpusLoader;
use fincast_core::error::{Error, Result};
use fincast_core::traits::{CompletionModel, DocumentLoader, Embedder, MarketDataSource, Retriever};
use fincast_core::ForecastBundle;
use fincast_vector::{build_or_load, IndexOptions};

use crate::enrichment::EnrichmentTask;
use crate::llm::ChatCompletionClient;
use crate::market::{fetch_or_empty, market_source_from_settings};
use crate::synthesizer::synthesize;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Deadline applied to every retrieval and to every completion call.
    pub llm_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { llm_timeout: Duration::from_secs(60) }
    }
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self { llm_timeout: Duration::from_secs(settings.llm.timeout_secs) }
    }
}

pub struct ForecastPipeline {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn CompletionModel>,
    market: Arc<dyn MarketDataSource>,
    options: PipelineOptions,
}

impl ForecastPipeline {
    pub fn new(retriever: Arc<dyn Retriever>, llm: Arc<dyn CompletionModel>, market: Arc<dyn MarketDataSource>, options: PipelineOptions) -> Self {
        Self { retriever, llm, market, options }
    }

    /// Builds or loads the index once, then wires the pipeline around it.
    ///
    /// Fails without constructing anything if the index cannot be initialized.
    pub async fn bootstrap(
        settings: &Settings,
        loader: &dyn DocumentLoader,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn CompletionModel>,
        market: Arc<dyn MarketDataSource>,
    ) -> Result<Self> {
        let index = build_or_load(&IndexOptions::from_settings(settings), loader, embedder).await?;
        tracing::info!(table = index.table_name(), top_k = index.top_k(), model = llm.model_id(), "forecast pipeline ready");
        Ok(Self::new(Arc::new(index), llm, market, PipelineOptions::from_settings(settings)))
    }

    /// Production wiring: configured embedder, chat client and market source.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let embedder: Arc<dyn Embedder> = fincast_embed::get_default_embedder(&settings.embed).map_err(Error::IndexInit)?.into();
        let llm = ChatCompletionClient::from_settings(&settings.llm).map_err(|e| Error::InvalidConfig(format!("{e:#}")))?;
        let market = market_source_from_settings(&settings.market).map_err(|e| Error::InvalidConfig(format!("{e:#}")))?;
        Self::bootstrap(settings, &CorpusLoader::new(), embedder, Arc::new(llm), market).await
    }

    /// Runs both enrichment tasks and the market fetch concurrently.
    ///
    /// Waits for all three. The first enrichment failure is returned and the
    /// sibling futures are dropped; a market failure only empties `market`.
    pub async fn run(&self, task: &str) -> Result<ForecastBundle> {
        if task.trim().is_empty() {
            return Err(Error::InvalidTask);
        }
        tracing::info!("Starting enrichment fan-out");
        let timeout = self.options.llm_timeout;
        let (extractor, analyzer) = (EnrichmentTask::FINANCIAL_EXTRACTOR, EnrichmentTask::QUALITATIVE_ANALYZER);
        let financials = extractor.run(task, self.llm.as_ref(), self.retriever.as_ref(), timeout);
        let qualitative = analyzer.run(task, self.llm.as_ref(), self.retriever.as_ref(), timeout);
        let market = async { Ok::<_, Error>(fetch_or_empty(self.market.as_ref()).await) };
        let (financials, qualitative, market) = tokio::try_join!(financials, qualitative, market)?;
        tracing::info!(financials_chars = financials.len(), qualitative_chars = qualitative.len(), market_entries = market.len(), "enrichment complete");
        Ok(ForecastBundle { financials, qualitative, market })
    }

    /// Fan-out followed by synthesis; returns the model's raw forecast text.
    pub async fn generate_forecast(&self, task: &str) -> Result<String> {
        let bundle = self.run(task).await?;
        synthesize(task, bundle, self.llm.as_ref(), self.options.llm_timeout).await
    }
}
