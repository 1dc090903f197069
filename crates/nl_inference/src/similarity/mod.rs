use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use nl_core::{Article, Result, Similarity};

/// Seam for the embedding model behind [`EmbeddingSimilarity`].
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>>;
}

/// Token-overlap similarity. No model calls, usable offline; the
/// production path is [`EmbeddingSimilarity`].
pub struct KeywordSimilarity;

impl KeywordSimilarity {
    fn tokens(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 2)
            .map(|t| t.to_lowercase())
            .collect()
    }

    fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        let intersection = a.intersection(b).count() as f32;
        let union = a.union(b).count() as f32;
        if union == 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

#[async_trait]
impl Similarity for KeywordSimilarity {
    fn name(&self) -> &str {
        "KeywordOverlap"
    }

    async fn score(&self, a: &Article, b: &Article) -> Result<f32> {
        let text_a = format!("{} {}", a.title, a.body_text);
        let text_b = format!("{} {}", b.title, b.body_text);
        Ok(Self::jaccard(&Self::tokens(&text_a), &Self::tokens(&text_b)))
    }
}

/// Embedding-backed similarity: cosine of the two article embeddings,
/// mapped from [-1, 1] onto [0, 1].
pub struct EmbeddingSimilarity {
    model: Arc<dyn EmbeddingModel>,
}

impl EmbeddingSimilarity {
    pub fn new(model: Arc<dyn EmbeddingModel>) -> Self {
        Self { model }
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

impl fmt::Debug for EmbeddingSimilarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingSimilarity")
            .field("model", &"<dyn EmbeddingModel>")
            .finish()
    }
}

#[async_trait]
impl Similarity for EmbeddingSimilarity {
    fn name(&self) -> &str {
        "Embedding"
    }

    async fn score(&self, a: &Article, b: &Article) -> Result<f32> {
        if a.id == b.id {
            return Ok(1.0);
        }
        let embedding_a = self.model.generate_embeddings(&a.body_text).await?;
        let embedding_b = self.model.generate_embeddings(&b.body_text).await?;
        let cosine = Self::cosine(&embedding_a, &embedding_b);
        Ok(((cosine + 1.0) / 2.0).clamp(0.0, 1.0))
    }
}

/// Deterministic embedding from text length and character frequencies.
/// Stands in for a real model in tests and demos.
pub struct CharFrequencyEmbedder;

#[async_trait]
impl EmbeddingModel for CharFrequencyEmbedder {
    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0; 768];
        if text.is_empty() {
            return Ok(embedding);
        }
        let text_len = text.len() as f32;
        embedding[0] = text_len / 1000.0;
        for c in text.chars() {
            let bucket = (c as usize % 767) + 1;
            embedding[bucket] += 1.0 / text_len;
        }
        Ok(embedding)
    }
}
