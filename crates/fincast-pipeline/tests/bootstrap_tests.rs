use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fincast_core::config::Settings;
use fincast_core::data_processor::CorpusLoader;
use fincast_core::traits::CompletionModel;
use fincast_core::{Error, MarketSnapshot};
use fincast_embed::FakeEmbedder;
use fincast_pipeline::{parse_forecast, ForecastPipeline, StaticMarketSource};
use tempfile::TempDir;

const FORECAST: &str = r#"```json
{
  "trends": {"revenue_growth": "4% QoQ"},
  "management_outlook": {"sentiment": "optimistic"},
  "risks": [{"risk": "currency volatility", "impact": "low"}],
  "opportunities": [{"opportunity": "cloud migration deals", "benefit": "higher order book"}],
  "assumptions": ["Stable demand in North America"],
  "overall_forecast": {"summary": "Moderate growth", "confidence_level": "medium"}
}
```"#;

#[derive(Default)]
struct RecordingModel {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl CompletionModel for RecordingModel {
    fn model_id(&self) -> &str {
        "recording"
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("senior financial analyst") {
            Ok(FORECAST.to_string())
        } else {
            Ok("extracted".to_string())
        }
    }
}

fn settings_for(root: &std::path::Path) -> Settings {
    let mut settings = Settings::default();
    settings.corpus.reports_dir = root.join("Reports").to_string_lossy().to_string();
    settings.corpus.transcripts_dir = root.join("Transcripts").to_string_lossy().to_string();
    settings.index.path = root.join("lancedb").to_string_lossy().to_string();
    settings
}

#[tokio::test]
async fn bootstrap_builds_index_and_runs_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let settings = settings_for(tmp.path());
    fs::create_dir_all(settings.corpus.reports_path()).unwrap();
    fs::create_dir_all(settings.corpus.transcripts_path()).unwrap();
    fs::write(settings.corpus.reports_path().join("q3.txt"), "Q3 FY25 revenue grew to 64,259 crore with operating margin of 24.1%.").unwrap();
    fs::write(settings.corpus.transcripts_path().join("q3_call.txt"), "Management was optimistic about the deal pipeline and AI-led demand.").unwrap();

    let llm = Arc::new(RecordingModel::default());
    let market = Arc::new(StaticMarketSource::new(MarketSnapshot::from([("Stock P/E".to_string(), "28.5".to_string())])));
    let pipeline = ForecastPipeline::bootstrap(&settings, &CorpusLoader::new(), Arc::new(FakeEmbedder::new(64)), llm.clone(), market)
        .await
        .expect("bootstrap");

    let raw = pipeline.generate_forecast("Forecast the next quarter").await.expect("forecast");
    assert_eq!(raw, FORECAST);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 3);

    let prompts = llm.prompts.lock().unwrap().clone();
    assert!(prompts.iter().any(|p| p.contains("64,259 crore") && p.contains("quarterly financial report")));
    assert!(prompts.iter().any(|p| p.contains("deal pipeline") && p.contains("earnings call transcripts")));

    let forecast = parse_forecast(&raw).expect("valid forecast");
    assert_eq!(forecast.risks[0].name, "currency volatility");
    assert_eq!(forecast.opportunities[0].name, "cloud migration deals");
}

#[tokio::test]
async fn bootstrap_without_corpus_never_builds_a_pipeline() {
    let tmp = TempDir::new().unwrap();
    let settings = settings_for(tmp.path());
    let llm = Arc::new(RecordingModel::default());
    let result = ForecastPipeline::bootstrap(&settings, &CorpusLoader::new(), Arc::new(FakeEmbedder::new(64)), llm.clone(), Arc::new(StaticMarketSource::new(MarketSnapshot::new()))).await;
    let err = result.err().expect("must fail");
    assert!(matches!(err, Error::MissingCorpus { .. }), "got {err}");
    assert_eq!(err.stage(), "corpus");
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
}
