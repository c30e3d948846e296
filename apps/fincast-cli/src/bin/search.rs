use std::{env, sync::Arc};

use fincast_cli::{flag_value, init_tracing, load_settings};
use fincast_core::data_processor::CorpusLoader;
use fincast_core::traits::Embedder;
use fincast_core::SourceCategory;
use fincast_embed::get_default_embedder;
use fincast_vector::{build_or_load, IndexOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [--category report|transcript] [--limit N]", args[0]);
        eprintln!("Example: {} 'operating margin' --category report --limit 5", args[0]);
        std::process::exit(1);
    }
    let settings = load_settings()?;
    let query_text = &args[1];
    let mut categories = SourceCategory::ALL.to_vec();
    let mut limit = settings.retrieval.top_k;
    let mut i = 2; while i < args.len() { match args[i].as_str() {
        "--category" => { match flag_value(&args, i, "--category").parse::<SourceCategory>() { Ok(c) => categories = vec![c], Err(e) => { eprintln!("Error: {}", e); std::process::exit(2); } } i += 1; }
        "--limit" => { if let Ok(l) = flag_value(&args, i, "--limit").parse::<usize>() { limit = l; i += 1; } else { eprintln!("Error: --limit requires a number"); std::process::exit(2); } }
        other => { eprintln!("Unknown argument: {}", other); std::process::exit(2); } } i += 1; }

    let opts = IndexOptions::from_settings(&settings);
    println!("🔍 fincast-search\n================");
    println!("Query: {}", query_text); println!("Index: {}", opts.index_path.display());
    let embedder: Arc<dyn Embedder> = get_default_embedder(&settings.embed)?.into();
    let index = match build_or_load(&opts, &CorpusLoader::new(), embedder).await {
        Ok(index) => index,
        Err(e) => { eprintln!("❌ [{}] {}", e.stage(), e); std::process::exit(1); }
    };
    for category in categories {
        let results = index.search(query_text, category, limit).await?;
        println!("\n🔍 {} {} results for: \"{}\"", results.len(), category, query_text);
        for (i, result) in results.iter().enumerate() {
            println!("\n  {}. score={:.4}  id={}  path={}", i + 1, result.score, result.id, result.doc_path);
            println!("     📝 Content: {}", result.content);
        }
    }
    Ok(())
}
