use std::fs;
use std::path::Path;
use std::sync::Arc;

use fincast_core::config::ChunkingConfig;
use fincast_core::data_processor::CorpusLoader;
use fincast_core::SourceCategory;
use fincast_embed::FakeEmbedder;
use fincast_vector::{build_or_load, IndexOptions};
use tempfile::TempDir;

fn seed_corpora(root: &Path) -> IndexOptions {
    let reports = root.join("Reports");
    let transcripts = root.join("Transcripts");
    fs::create_dir_all(&reports).unwrap();
    fs::create_dir_all(&transcripts).unwrap();
    fs::write(reports.join("q1.txt"), "Q1 FY25 total revenue 62,613 crore. Operating margin 24.2%. EPS 32.9.\n\nNet profit 12,224 crore; finance costs 201 crore.").unwrap();
    fs::write(reports.join("q2.txt"), "Q2 FY25 total revenue 64,259 crore. Operating margin 24.1%. Free cash flow 11,000 crore.").unwrap();
    fs::write(transcripts.join("call_q1.txt"), "Management sentiment is cautiously optimistic about revenue growth. The CEO discussed deal wins and AI demand.").unwrap();
    fs::write(transcripts.join("call_q2.txt"), "On the call, management flagged discretionary spend weakness as a short-term risk to revenue.").unwrap();
    IndexOptions {
        reports_dir: reports,
        transcripts_dir: transcripts,
        index_path: root.join("index"),
        table: "chunks".into(),
        chunking: ChunkingConfig { chunk_size: 120, chunk_overlap: 60 },
        top_k: 4,
    }
}

#[tokio::test]
async fn build_then_filtered_search() {
    let tmp = TempDir::new().expect("tmp");
    let opts = seed_corpora(tmp.path());
    let index = build_or_load(&opts, &CorpusLoader::new(), Arc::new(FakeEmbedder::new(64))).await.expect("build");

    assert!(opts.index_path.exists());
    assert!(index.count_rows().await.expect("count") >= 4);
    let manifest = index.manifest().expect("manifest");
    assert_eq!(manifest.dim, 64);
    assert_eq!(manifest.chunk_size, 120);

    // "revenue" appears in both corpora; each filter must only see its own side.
    for category in SourceCategory::ALL {
        let hits = index.search("revenue growth", category, 10).await.expect("search");
        assert!(!hits.is_empty(), "{category} should have matches");
        for h in &hits {
            assert_eq!(h.category, category);
            assert!(h.doc_path.contains(if category == SourceCategory::Report { "Reports" } else { "Transcripts" }));
        }
        for pair in hits.windows(2) { assert!(pair[0].score >= pair[1].score); }
    }
}

#[tokio::test]
async fn retrieval_respects_top_k() {
    let tmp = TempDir::new().expect("tmp");
    let mut opts = seed_corpora(tmp.path());
    opts.top_k = 2;
    let index = build_or_load(&opts, &CorpusLoader::new(), Arc::new(FakeEmbedder::new(64))).await.expect("build");
    use fincast_core::traits::Retriever;
    let hits = index.retrieve("operating margin", SourceCategory::Report).await.expect("retrieve");
    assert!(hits.len() <= 2);
    assert!(!hits.is_empty());
}

#[tokio::test]
async fn category_without_documents_returns_no_hits() {
    let tmp = TempDir::new().expect("tmp");
    let opts = seed_corpora(tmp.path());
    for entry in fs::read_dir(&opts.transcripts_dir).unwrap() { fs::remove_file(entry.unwrap().path()).unwrap(); }
    let index = build_or_load(&opts, &CorpusLoader::new(), Arc::new(FakeEmbedder::new(64))).await.expect("build");
    let hits = index.search("management sentiment", SourceCategory::Transcript, 4).await.expect("search");
    assert!(hits.is_empty());
}
