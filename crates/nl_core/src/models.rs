use async_trait::async_trait;
use crate::types::{Article, SummaryStyle};
use crate::Result;

#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    /// Summarize raw article text in the requested style. May be slow
    /// (seconds) and may fail; callers decide whether to retry.
    async fn summarize(&self, body_text: &str, style: SummaryStyle) -> Result<String>;
}

#[async_trait]
pub trait Similarity: Send + Sync {
    fn name(&self) -> &str;

    /// Score two articles in [0, 1]. Symmetric, and 1.0 for an article
    /// against itself.
    async fn score(&self, a: &Article, b: &Article) -> Result<f32>;
}
