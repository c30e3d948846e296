//! Recursive character splitter.
//!
//! Text is split on the first separator that occurs in it (paragraph, line,
//! word, then single characters). Pieces shorter than the window are merged
//! greedily; when a chunk is emitted, its tail (up to `chunk_overlap` chars)
//! seeds the next one. Lengths are counted in chars, not bytes.

use crate::config::ChunkingConfig;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    config: ChunkingConfig,
}

impl RecursiveSplitter {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut remaining: &[&str] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = sep;
                break;
            }
            if text.contains(sep) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut short: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.config.chunk_size {
                short.push(piece);
                continue;
            }
            if !short.is_empty() {
                chunks.extend(self.merge(&short, separator));
                short.clear();
            }
            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }
        if !short.is_empty() {
            chunks.extend(self.merge(&short, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut out = Vec::new();
        let mut current: std::collections::VecDeque<&str> = std::collections::VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joiner = if current.is_empty() { 0 } else { sep_len };
            if total + len + joiner > size && !current.is_empty() {
                push_joined(&mut out, &current, separator);
                // Drop from the front until what is left fits as overlap and
                // leaves room for the incoming piece.
                while total > overlap
                    || (total > 0 && total + len + if current.is_empty() { 0 } else { sep_len } > size)
                {
                    let Some(front) = current.pop_front() else { break };
                    total -= char_len(front) + if current.is_empty() { 0 } else { sep_len };
                }
            }
            let joiner = if current.is_empty() { 0 } else { sep_len };
            current.push_back(piece);
            total += len + joiner;
        }
        push_joined(&mut out, &current, separator);
        out
    }
}

fn push_joined(out: &mut Vec<String>, parts: &std::collections::VecDeque<&str>, separator: &str) {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(size: usize, overlap: usize) -> RecursiveSplitter {
        RecursiveSplitter::new(ChunkingConfig { chunk_size: size, chunk_overlap: overlap })
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = splitter(1000, 500).split("Revenue grew 12% year over year.");
        assert_eq!(chunks, vec!["Revenue grew 12% year over year.".to_string()]);
    }

    #[test]
    fn chunks_respect_the_window() {
        let text = (0..400).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let chunks = splitter(100, 50).split(&text);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= 100, "chunk too long: {}", c.chars().count());
        }
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let text = (0..200).map(|i| format!("w{i:03}")).collect::<Vec<_>>().join(" ");
        let chunks = splitter(60, 30).split(&text);
        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            let last_word = pair[0].split(' ').last().unwrap();
            assert!(pair[1].contains(last_word), "expected '{last_word}' carried into next chunk");
        }
    }

    #[test]
    fn paragraphs_are_preferred_split_points() {
        let a = "a".repeat(40);
        let b = "b".repeat(40);
        let chunks = splitter(50, 10).split(&format!("{a}\n\n{b}"));
        assert_eq!(chunks, vec![a, b]);
    }

    #[test]
    fn unbroken_text_falls_back_to_characters() {
        let text = "x".repeat(250);
        let chunks = splitter(100, 20).split(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
        let covered: usize = chunks.iter().map(|c| c.len()).sum();
        assert!(covered >= 250);
    }

    #[test]
    fn multibyte_text_is_counted_in_chars() {
        let text = "₹".repeat(30);
        let chunks = splitter(10, 0).split(&text);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() == 10));
    }

    #[test]
    fn whitespace_only_yields_nothing() {
        assert!(splitter(100, 10).split("  \n\n \n ").is_empty());
    }
}
