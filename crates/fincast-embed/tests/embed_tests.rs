use fincast_core::config::EmbedSettings;
use fincast_embed::{get_default_embedder, FakeEmbedder, FAKE_DIM};
use fincast_embed::Embedder;

fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = EmbedSettings { model_dir: None, use_fake: true };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), FAKE_DIM);
    assert_eq!(embedder.dim(), FAKE_DIM);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_ranks_shared_vocabulary_higher() {
    let e = FakeEmbedder::new(FAKE_DIM);
    let embs = e
        .embed_batch(&[
            "quarterly revenue and operating margin".to_string(),
            "revenue margin quarterly".to_string(),
            "management sentiment on hiring".to_string(),
        ])
        .unwrap();
    assert!(cosine(&embs[0], &embs[1]) > cosine(&embs[0], &embs[2]));
}

#[test]
fn empty_text_still_embeds_to_unit_vector() {
    let e = FakeEmbedder::new(8);
    let v = e.embed_batch(&[String::new()]).unwrap().remove(0);
    assert_eq!(v.len(), 8);
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-6);
}

#[test]
fn missing_model_dir_is_an_error() {
    let settings = EmbedSettings { model_dir: Some("/nonexistent/fincast/model".into()), use_fake: false };
    if std::env::var("APP_USE_FAKE_EMBEDDINGS").is_ok() { return; }
    assert!(get_default_embedder(&settings).is_err());
}
