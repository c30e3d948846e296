//! Sentence embedding backends.
//!
//! `BertEmbedder` runs a BERT-family sentence encoder (all-MiniLM-L6-v2 by
//! default) with candle. `FakeEmbedder` hashes tokens into a fixed-size vector
//! and is used for tests and offline development.

use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

pub use fincast_core::traits::Embedder;
use fincast_core::config::EmbedSettings;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use pool::masked_mean_l2;

pub const DEFAULT_MODEL_DIR: &str = "models/all-MiniLM-L6-v2";
pub const FAKE_DIM: usize = 384;

pub struct BertEmbedder { model: BertModel, tokenizer: Tokenizer, device: Device, id: String, dim: usize, max_len: usize, pad_id: u32 }

impl BertEmbedder {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = device::select_device();
        tracing::info!("Loading sentence encoder from {}", model_dir.display());
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)?;
        let config: BertConfig = serde_json::from_str(&raw_config)
            .map_err(|e| anyhow!("Failed to parse {}: {}", config_path.display(), e))?;
        let shape: serde_json::Value = serde_json::from_str(&raw_config)?;
        let dim = shape["hidden_size"].as_u64().ok_or_else(|| anyhow!("config.json has no hidden_size"))? as usize;
        let max_len = shape["max_position_embeddings"].as_u64().unwrap_or(512).min(512) as usize;
        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);
        let name = model_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "bert".into());
        let id = format!("bert:{}:d{}", name, dim);
        tracing::info!("Sentence encoder ready ({})", id);
        Ok(Self { model, tokenizer, device, id, dim, max_len, pad_id })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let (input_ids, attention_mask) = tokenize::tokenize_batch(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_dtype(DType::F32)?.to_device(&Device::Cpu)?.to_vec2()?;
        Ok(vectors)
    }
}

impl Embedder for BertEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(32) { out.extend(self.embed_chunk(batch)?); }
        Ok(out)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        // SAFETY: the weights file is memory-mapped read-only and not modified while the model lives.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? };
        return Ok(vb);
    }
    let weights_path = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&weights_path)
        .map_err(|e| anyhow!("No usable weights in {}: {}", model_dir.display(), e))?;
    let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}

/// Deterministic bag-of-tokens embedder; similar texts share hashed dimensions.
pub struct FakeEmbedder { dim: usize, id: String }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim, id: format!("fake:xxhash:d{}", dim) } }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            v[idx] += 0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32);
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt();
        if norm <= 1e-6 {
            // Empty input still has to yield a unit vector.
            v[0] = 1.0;
            return v;
        }
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Picks the embedder from settings, honouring `APP_USE_FAKE_EMBEDDINGS=1`.
pub fn get_default_embedder(settings: &EmbedSettings) -> Result<Box<dyn Embedder>> {
    let use_fake = settings.use_fake || std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if use_fake { tracing::info!("Using FakeEmbedder"); return Ok(Box::new(FakeEmbedder::new(FAKE_DIM))); }
    let model_dir = resolve_model_dir(settings.model_dir.as_deref())?;
    Ok(Box::new(BertEmbedder::load(&model_dir)?))
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured { let p = fincast_core::config::expand_path(dir); if p.exists() { return Ok(p); } return Err(anyhow!("Configured model directory does not exist: {}", p.display())); }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { tracing::info!("Using APP_MODEL_DIR: {}", p.display()); return Ok(p); } }
    let local = Path::new(DEFAULT_MODEL_DIR); if local.exists() { return Ok(local.to_path_buf()); }
    let parent = Path::new("..").join(DEFAULT_MODEL_DIR); if parent.exists() { return Ok(parent); }
    Err(anyhow!("Could not locate sentence encoder directory (set embed.model_dir or APP_MODEL_DIR)"))
}
