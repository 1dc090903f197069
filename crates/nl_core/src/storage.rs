use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::fingerprint::Fingerprint;
use crate::types::{Article, StoryMembership, SummaryRecord, TrackedStory, TrackingContext};
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Store an article, replacing any previous version with the same id.
    async fn store_article(&self, article: &Article) -> Result<()>;

    async fn get_article(&self, article_id: &str) -> Result<Option<Article>>;
}

#[async_trait]
pub trait SummaryStore: Send + Sync {
    async fn get_summary(&self, fingerprint: &Fingerprint) -> Result<Option<SummaryRecord>>;

    /// Atomic create-if-absent. Returns the record now stored under the
    /// fingerprint: the given one, or the pre-existing record when a
    /// concurrent writer got there first.
    async fn put_summary_if_absent(&self, record: SummaryRecord) -> Result<SummaryRecord>;
}

/// Outcome of a membership append against the storage-level uniqueness
/// constraint on `(tracking context, article id)`.
#[derive(Debug, Clone)]
pub enum MembershipInsert {
    Inserted(StoryMembership),
    AlreadyPresent(StoryMembership),
}

#[async_trait]
pub trait StoryStore: Send + Sync {
    /// All stories for a tracking context, most recently updated first.
    async fn stories_for_context(&self, context: &TrackingContext) -> Result<Vec<TrackedStory>>;

    /// All stories owned by a user, across keywords, newest first.
    async fn stories_for_owner(&self, owner: &str) -> Result<Vec<TrackedStory>>;

    async fn get_story(&self, story_id: &str) -> Result<Option<TrackedStory>>;

    /// Create a story with its initial member. If the initial member is
    /// already attached to a story in the same context, the existing
    /// (earlier-created) story is returned unchanged and the new one is
    /// discarded.
    async fn create_story(&self, story: TrackedStory) -> Result<TrackedStory>;

    /// Append an article to a story. Enforces the per-context uniqueness
    /// constraint and bumps `last_updated_at` monotonically.
    async fn add_member(
        &self,
        story_id: &str,
        article_id: &str,
        added_at: DateTime<Utc>,
    ) -> Result<MembershipInsert>;

    async fn membership_for_article(
        &self,
        context: &TrackingContext,
        article_id: &str,
    ) -> Result<Option<StoryMembership>>;

    /// Delete a story owned by `owner`; memberships cascade. Returns
    /// whether a story was deleted.
    async fn delete_story(&self, owner: &str, story_id: &str) -> Result<bool>;
}
