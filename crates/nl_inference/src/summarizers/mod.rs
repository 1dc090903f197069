use std::sync::Arc;

use nl_core::{Error, Result, Summarizer};

use crate::Config;

pub mod chat;
pub mod dummy;

pub use chat::ChatSummarizer;
pub use dummy::DummySummarizer;

pub fn create_summarizer(name: &str, config: &Config) -> Result<Arc<dyn Summarizer>> {
    match name {
        "dummy" => Ok(Arc::new(DummySummarizer)),
        "chat" => Ok(Arc::new(ChatSummarizer::new(config.clone())?)),
        other => Err(Error::Compute(format!("unknown summarizer: {}", other))),
    }
}
