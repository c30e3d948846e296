use std::env;

use fincast_cli::{init_tracing, load_settings};
use fincast_pipeline::{parse_forecast, ForecastPipeline, DEFAULT_TASK};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut raw = false;
    let mut words = Vec::new();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--raw" => raw = true,
            "-h" | "--help" => { println!("Usage: fincast [task...] [--raw]"); return Ok(()); }
            _ => words.push(arg),
        }
    }
    let task = if words.is_empty() { DEFAULT_TASK.to_string() } else { words.join(" ") };
    let settings = load_settings()?;

    let pipeline = match ForecastPipeline::from_settings(&settings).await {
        Ok(p) => p,
        Err(e) => { eprintln!("❌ [{}] {}", e.stage(), e); std::process::exit(1); }
    };
    let output = match pipeline.generate_forecast(&task).await {
        Ok(text) => text,
        Err(e) => { eprintln!("❌ [{}] {}", e.stage(), e); std::process::exit(1); }
    };
    if raw {
        println!("{}", output);
        return Ok(());
    }
    match parse_forecast(&output) {
        Ok(forecast) => println!("{}", serde_json::to_string_pretty(&forecast)?),
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("❌ [{}] Failed to parse forecast output as JSON. Re-run with --raw to see it.", e.stage());
            std::process::exit(1);
        }
    }
    Ok(())
}
