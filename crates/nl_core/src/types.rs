use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::fingerprint::Fingerprint;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub source_url: String,
    pub title: String,
    pub body_text: String,
    pub published_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
}

impl Article {
    /// Derive a stable id for sources that carry no natural identifier.
    /// The same `(source_url, published_at)` always maps to the same id,
    /// so retries of one logical item never produce duplicates.
    pub fn derive_id(source_url: &str, published_at: DateTime<Utc>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source_url.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(published_at.timestamp_millis().to_be_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidArticle("article id is empty".to_string()));
        }
        if self.body_text.trim().is_empty() {
            return Err(Error::InvalidArticle(format!(
                "article {} has empty body text",
                self.id
            )));
        }
        url::Url::parse(&self.source_url)
            .map_err(|_| Error::InvalidUrl(self.source_url.clone()))?;
        Ok(())
    }
}

/// Closed set of recognized summary styles. Parsing is the single
/// validation point; everything downstream works with the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryStyle {
    Default,
    OpposingViews,
    Simplified,
}

impl SummaryStyle {
    pub const ALL: [SummaryStyle; 3] = [
        SummaryStyle::Default,
        SummaryStyle::OpposingViews,
        SummaryStyle::Simplified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStyle::Default => "default",
            SummaryStyle::OpposingViews => "opposing-views",
            SummaryStyle::Simplified => "simplified",
        }
    }
}

impl fmt::Display for SummaryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(SummaryStyle::Default),
            "opposing-views" => Ok(SummaryStyle::OpposingViews),
            "simplified" => Ok(SummaryStyle::Simplified),
            other => Err(Error::InvalidStyle(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub fingerprint: Fingerprint,
    pub summary_text: String,
    pub generated_at: DateTime<Utc>,
    pub source_article_id: String,
    pub style: SummaryStyle,
}

/// Scope within which story membership is computed. Articles are
/// clustered independently per context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackingContext {
    pub owner: String,
    pub keyword: String,
}

impl TrackingContext {
    pub fn new(owner: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            keyword: keyword.into(),
        }
    }
}

impl fmt::Display for TrackingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.keyword)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedStory {
    pub story_id: String,
    pub context: TrackingContext,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    /// Member article ids in the order assignment decisions completed.
    pub member_article_ids: Vec<String>,
}

impl TrackedStory {
    pub fn contains(&self, article_id: &str) -> bool {
        self.member_article_ids.iter().any(|id| id == article_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryMembership {
    pub story_id: String,
    pub article_id: String,
    pub added_at: DateTime<Utc>,
}
