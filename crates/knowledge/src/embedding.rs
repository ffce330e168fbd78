//! Lightweight hashed-bucket embeddings for offline similarity search.
//!
//! Words and character trigrams are hashed with SHA-256 into a fixed number
//! of buckets. Leading words weigh more than trailing ones. Vectors are L2
//! normalized, so the dot product of two embeddings is their cosine
//! similarity. No model download is needed and results are deterministic
//! across runs and platforms.

use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::types::KnowledgeConfig;

const TRIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic text embedder used by the in-memory knowledge base.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    max_words: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize, max_words: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            max_words,
        }
    }

    pub fn from_config(config: &KnowledgeConfig) -> Self {
        Self::new(config.embedding_dim, config.max_embedded_words)
    }

    /// Generate the embedding for a piece of text.
    #[instrument(level = "trace", skip(self, text), fields(text_len = text.len()))]
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let text = text.trim().to_lowercase();
        let mut embedding = vec![0.0f32; self.dimension];

        for (i, word) in text.split_whitespace().take(self.max_words).enumerate() {
            embedding[self.bucket(word)] += 1.0 / (i as f32 + 1.0);
        }

        let chars: Vec<char> = text.chars().collect();
        for window in chars.windows(3) {
            let trigram: String = window.iter().collect();
            embedding[self.bucket(&trigram)] += TRIGRAM_WEIGHT;
        }

        let magnitude = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for x in &mut embedding {
                *x /= magnitude;
            }
        }

        embedding
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(head) % self.dimension as u64) as usize
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::from_config(&KnowledgeConfig::default())
    }
}

/// Cosine similarity of two normalized embeddings. Mismatched lengths score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
