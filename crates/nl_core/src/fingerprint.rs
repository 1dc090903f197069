use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::types::SummaryStyle;

/// Identity key for a summarization request, derived from the article id
/// and the requested style. Equal inputs always yield equal keys; any
/// change to either input yields a different key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(article_id: &str, style: SummaryStyle) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(article_id.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(style.as_str().as_bytes());
        Fingerprint(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = Fingerprint::compute("article-1", SummaryStyle::Default);
        let b = Fingerprint::compute("article-1", SummaryStyle::Default);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_changes_with_inputs() {
        let base = Fingerprint::compute("article-1", SummaryStyle::Default);
        assert_ne!(base, Fingerprint::compute("article-2", SummaryStyle::Default));
        assert_ne!(base, Fingerprint::compute("article-1", SummaryStyle::Simplified));
    }
}
