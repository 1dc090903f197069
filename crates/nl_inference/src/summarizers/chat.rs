use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use nl_core::{Error, Result, Summarizer, SummaryStyle};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::Config;

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
const DEFAULT_MODEL: &str = "deepseek-chat";

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// Summarizer backed by an OpenAI-compatible chat completion endpoint.
pub struct ChatSummarizer {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatSummarizer {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            client: Arc::new(Client::new()),
            api_key: config.api_key.unwrap_or_default(),
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: config.model_name.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    fn prompt(body_text: &str, style: SummaryStyle) -> String {
        match style {
            SummaryStyle::Default => format!(
                "Please summarize the following article concisely:\n\n{}\n\nSummary:",
                body_text
            ),
            SummaryStyle::OpposingViews => format!(
                "Summarize the following article by presenting the main opposing \
                 viewpoints on the topic, giving each side equal weight:\n\n{}\n\nSummary:",
                body_text
            ),
            SummaryStyle::Simplified => format!(
                "Summarize the following article in simple language a child could \
                 understand:\n\n{}\n\nSummary:",
                body_text
            ),
        }
    }
}

impl fmt::Debug for ChatSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSummarizer")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    fn name(&self) -> &str {
        "Chat"
    }

    async fn summarize(&self, body_text: &str, style: SummaryStyle) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Self::prompt(body_text, style),
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?
            .json::<ChatResponse>()
            .await?;

        response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| Error::Compute("chat completion returned no choices".to_string()))
    }
}
