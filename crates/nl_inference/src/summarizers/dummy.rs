use async_trait::async_trait;
use nl_core::{Result, Summarizer, SummaryStyle};

/// Offline summarizer for tests and demos. Truncates the text instead
/// of calling a model.
pub struct DummySummarizer;

#[async_trait]
impl Summarizer for DummySummarizer {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn summarize(&self, body_text: &str, style: SummaryStyle) -> Result<String> {
        let words: Vec<&str> = body_text.split_whitespace().collect();
        match style {
            SummaryStyle::Default => {
                let take = words.len().min(25);
                Ok(format!("[{}] {}", style, words[..take].join(" ")))
            }
            SummaryStyle::Simplified => {
                let take = words.len().min(12);
                Ok(format!("[{}] {}", style, words[..take].join(" ")))
            }
            SummaryStyle::OpposingViews => {
                // Two halves of the lead stand in for the two sides.
                let take = words.len().min(24);
                let (first, second) = words[..take].split_at(take / 2);
                Ok(format!(
                    "[{}] For: {} / Against: {}",
                    style,
                    first.join(" "),
                    second.join(" ")
                ))
            }
        }
    }
}
