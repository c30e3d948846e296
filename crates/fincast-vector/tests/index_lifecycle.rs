use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fincast_core::config::ChunkingConfig;
use fincast_core::data_processor::CorpusLoader;
use fincast_core::traits::{DocumentLoader, Embedder, Retriever};
use fincast_core::{Document, Error, SourceCategory};
use fincast_embed::FakeEmbedder;
use fincast_vector::{build_or_load, IndexOptions};
use tempfile::TempDir;

/// Delegates to the real loader and counts directory reads.
struct CountingLoader { inner: CorpusLoader, reads: AtomicUsize }

impl CountingLoader {
    fn new() -> Self { Self { inner: CorpusLoader::new(), reads: AtomicUsize::new(0) } }
    fn reads(&self) -> usize { self.reads.load(Ordering::SeqCst) }
}

impl DocumentLoader for CountingLoader {
    fn load_dir(&self, dir: &Path, category: SourceCategory) -> anyhow::Result<Vec<Document>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.load_dir(dir, category)
    }
}

/// Holds the calling thread for a fixed time before delegating, like a CPU-bound model would.
struct SlowEmbedder { inner: FakeEmbedder, delay: Duration }

impl Embedder for SlowEmbedder {
    fn embedder_id(&self) -> &str { self.inner.embedder_id() }
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        std::thread::sleep(self.delay);
        self.inner.embed_batch(texts)
    }
}

fn options(root: &Path) -> IndexOptions {
    IndexOptions {
        reports_dir: root.join("Reports"),
        transcripts_dir: root.join("Transcripts"),
        index_path: root.join("index"),
        table: "chunks".into(),
        chunking: ChunkingConfig::default(),
        top_k: 4,
    }
}

fn seed(opts: &IndexOptions) {
    fs::create_dir_all(&opts.reports_dir).unwrap();
    fs::create_dir_all(&opts.transcripts_dir).unwrap();
    fs::write(opts.reports_dir.join("q3.txt"), "Q3 revenue $10B, EPS 2.1").unwrap();
    fs::write(opts.transcripts_dir.join("q3_call.txt"), "Sentiment: optimistic about Q4 demand").unwrap();
}

#[tokio::test]
async fn second_call_reuses_index_without_reading_corpora() {
    let tmp = TempDir::new().unwrap();
    let opts = options(tmp.path());
    seed(&opts);

    let first = CountingLoader::new();
    let index = build_or_load(&opts, &first, Arc::new(FakeEmbedder::new(32))).await.expect("build");
    assert_eq!(first.reads(), 2);
    let rows = index.count_rows().await.unwrap();
    drop(index);

    // Corpus changes after the build are not picked up: the stale index is accepted.
    fs::write(opts.reports_dir.join("q4.txt"), "Q4 revenue $12B").unwrap();

    let second = CountingLoader::new();
    let reloaded = build_or_load(&opts, &second, Arc::new(FakeEmbedder::new(32))).await.expect("load");
    assert_eq!(second.reads(), 0);
    assert_eq!(reloaded.count_rows().await.unwrap(), rows);
    assert!(reloaded.manifest().is_some());
}

#[tokio::test]
async fn existing_index_loads_even_when_corpora_are_gone() {
    let tmp = TempDir::new().unwrap();
    let opts = options(tmp.path());
    seed(&opts);
    build_or_load(&opts, &CorpusLoader::new(), Arc::new(FakeEmbedder::new(32))).await.expect("build");
    fs::remove_dir_all(&opts.reports_dir).unwrap();
    fs::remove_dir_all(&opts.transcripts_dir).unwrap();
    assert!(build_or_load(&opts, &CorpusLoader::new(), Arc::new(FakeEmbedder::new(32))).await.is_ok());
}

#[tokio::test]
async fn missing_reports_dir_fails_with_its_path() {
    let tmp = TempDir::new().unwrap();
    let opts = options(tmp.path());
    fs::create_dir_all(&opts.transcripts_dir).unwrap();
    let err = build_or_load(&opts, &CorpusLoader::new(), Arc::new(FakeEmbedder::new(32))).await.err().expect("should fail");
    assert!(matches!(err, Error::MissingCorpus { category: SourceCategory::Report, ref path } if *path == opts.reports_dir), "got {err}");
    assert!(!opts.index_path.exists(), "no index is created on failure");
}

#[tokio::test]
async fn missing_transcripts_dir_fails_with_its_path() {
    let tmp = TempDir::new().unwrap();
    let opts = options(tmp.path());
    fs::create_dir_all(&opts.reports_dir).unwrap();
    let err = build_or_load(&opts, &CorpusLoader::new(), Arc::new(FakeEmbedder::new(32))).await.err().expect("should fail");
    assert!(matches!(err, Error::MissingCorpus { category: SourceCategory::Transcript, ref path } if *path == opts.transcripts_dir), "got {err}");
}

#[tokio::test]
async fn empty_corpora_fail() {
    let tmp = TempDir::new().unwrap();
    let opts = options(tmp.path());
    fs::create_dir_all(&opts.reports_dir).unwrap();
    fs::create_dir_all(&opts.transcripts_dir).unwrap();
    let err = build_or_load(&opts, &CorpusLoader::new(), Arc::new(FakeEmbedder::new(32))).await.err().expect("should fail");
    assert!(matches!(err, Error::EmptyCorpus { .. }), "got {err}");
}

#[tokio::test]
async fn dimension_mismatch_on_load_is_an_init_error() {
    let tmp = TempDir::new().unwrap();
    let opts = options(tmp.path());
    seed(&opts);
    build_or_load(&opts, &CorpusLoader::new(), Arc::new(FakeEmbedder::new(32))).await.expect("build");
    let err = build_or_load(&opts, &CorpusLoader::new(), Arc::new(FakeEmbedder::new(48))).await.err().expect("should fail");
    assert!(matches!(err, Error::IndexInit(_)), "got {err}");
}

#[tokio::test]
async fn leftover_directory_without_table_is_rebuilt() {
    let tmp = TempDir::new().unwrap();
    let opts = options(tmp.path());
    seed(&opts);
    fs::create_dir_all(&opts.index_path).unwrap();
    let loader = CountingLoader::new();
    let index = build_or_load(&opts, &loader, Arc::new(FakeEmbedder::new(32))).await.expect("build");
    assert_eq!(loader.reads(), 2);
    assert!(index.count_rows().await.unwrap() > 0);
}

#[tokio::test]
async fn invalid_chunking_is_rejected_before_any_io() {
    let tmp = TempDir::new().unwrap();
    let mut opts = options(tmp.path());
    opts.chunking = ChunkingConfig { chunk_size: 10, chunk_overlap: 10 };
    let loader = CountingLoader::new();
    let err = build_or_load(&opts, &loader, Arc::new(FakeEmbedder::new(32))).await.err().expect("should fail");
    assert!(matches!(err, Error::InvalidConfig(_)));
    assert_eq!(loader.reads(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_searches_embed_in_parallel() {
    let tmp = TempDir::new().unwrap();
    let opts = options(tmp.path());
    seed(&opts);
    build_or_load(&opts, &CorpusLoader::new(), Arc::new(FakeEmbedder::new(32))).await.expect("build");

    let slow = Arc::new(SlowEmbedder { inner: FakeEmbedder::new(32), delay: Duration::from_millis(300) });
    let index = build_or_load(&opts, &CorpusLoader::new(), slow).await.expect("load");

    let started = Instant::now();
    let (reports, transcripts) = tokio::join!(
        index.retrieve("revenue", SourceCategory::Report),
        index.retrieve("sentiment", SourceCategory::Transcript),
    );
    let elapsed = started.elapsed();

    assert!(!reports.unwrap().is_empty());
    assert!(!transcripts.unwrap().is_empty());
    assert!(elapsed < Duration::from_millis(550), "searches ran back to back: {elapsed:?}");
}
