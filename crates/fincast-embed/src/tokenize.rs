use anyhow::{Result, anyhow};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Encoded batch: `(input_ids, attention_mask)`, both `[B, T]` u32, padded to the longest row.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, pad_id: u32, device: &Device) -> Result<(Tensor, Tensor)> {
    let encodings = tokenizer.encode_batch(texts.to_vec(), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let longest = encodings.iter().map(|e| e.get_ids().len().min(max_len)).max().unwrap_or(0).max(1);
    let mut ids = Vec::with_capacity(encodings.len() * longest);
    let mut mask = Vec::with_capacity(encodings.len() * longest);
    for enc in &encodings {
        let mut row_ids = enc.get_ids().to_vec();
        let mut row_mask = enc.get_attention_mask().to_vec();
        if row_ids.len() > max_len { row_ids.truncate(max_len); row_mask.truncate(max_len); }
        if row_ids.len() < longest { let pad = longest - row_ids.len(); row_ids.extend(std::iter::repeat(pad_id).take(pad)); row_mask.extend(std::iter::repeat(0).take(pad)); }
        ids.extend(row_ids);
        mask.extend(row_mask);
    }
    let input_ids = Tensor::from_vec(ids, (encodings.len(), longest), device)?;
    let attention_mask = Tensor::from_vec(mask, (encodings.len(), longest), device)?;
    Ok((input_ids, attention_mask))
}
