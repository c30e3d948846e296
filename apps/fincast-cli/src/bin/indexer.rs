use std::{env, fs, sync::Arc};

use fincast_cli::{flag_path, init_tracing, load_settings};
use fincast_core::data_processor::CorpusLoader;
use fincast_core::traits::Embedder;
use fincast_embed::get_default_embedder;
use fincast_vector::{build_or_load, IndexOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let settings = load_settings()?;
    let mut opts = IndexOptions::from_settings(&settings);
    let args: Vec<String> = env::args().skip(1).collect();
    let cwd = env::current_dir()?;
    let mut rebuild = false;
    let mut i = 0; while i < args.len() { match args[i].as_str() {
        "--reports" => { opts.reports_dir = flag_path(&args, i, "--reports", &cwd); i += 1; }
        "--transcripts" => { opts.transcripts_dir = flag_path(&args, i, "--transcripts", &cwd); i += 1; }
        "--index" => { opts.index_path = flag_path(&args, i, "--index", &cwd); i += 1; }
        "--rebuild" => rebuild = true,
        "-h" | "--help" => { println!("Usage: fincast-indexer [--reports DIR] [--transcripts DIR] [--index PATH] [--rebuild]"); return Ok(()); }
        other => { eprintln!("Unknown argument: {}", other); std::process::exit(2); } } i += 1; }

    println!("Fincast Indexer\n===============");
    println!("Reports:     {}", opts.reports_dir.display());
    println!("Transcripts: {}", opts.transcripts_dir.display());
    println!("Index:       {} (table '{}')", opts.index_path.display(), opts.table);
    if rebuild && opts.index_path.exists() {
        println!("⚠️  Removing existing index (--rebuild)");
        fs::remove_dir_all(&opts.index_path)?;
    }

    let embedder: Arc<dyn Embedder> = get_default_embedder(&settings.embed)?.into();
    let index = match build_or_load(&opts, &CorpusLoader::new(), embedder).await {
        Ok(index) => index,
        Err(e) => { eprintln!("❌ [{}] {}", e.stage(), e); std::process::exit(1); }
    };
    println!("\n✅ Index ready: {} chunks", index.count_rows().await?);
    if let Some(m) = index.manifest() {
        println!("📊 Embedder {} (dim {}), chunks {}/{} chars, built {}", m.embedder_id, m.dim, m.chunk_size, m.chunk_overlap, m.built_at);
    }
    println!("\n💡 To inspect retrieval, use: cargo run --bin fincast-search '<query>' --category report");
    Ok(())
}
