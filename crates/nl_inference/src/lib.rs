pub mod similarity;
pub mod summarizers;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
}

pub use summarizers::create_summarizer;

pub mod prelude {
    pub use super::similarity::{EmbeddingSimilarity, KeywordSimilarity};
    pub use super::summarizers::{ChatSummarizer, DummySummarizer};
    pub use super::Config;
    pub use nl_core::{Article, Error, Result, Similarity, Summarizer};
}
