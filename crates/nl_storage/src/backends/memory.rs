use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nl_core::{
    Article, ArticleStore, Error, Fingerprint, MembershipInsert, Result, StoryMembership,
    StoryStore, SummaryRecord, SummaryStore, TrackedStory, TrackingContext,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct MemoryStore {
    articles: HashMap<String, Article>,
    summaries: HashMap<Fingerprint, SummaryRecord>,
    stories: HashMap<String, TrackedStory>,
    memberships: HashMap<String, Vec<StoryMembership>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn context_stories(&self, context: &TrackingContext) -> Vec<&TrackedStory> {
        let mut stories: Vec<&TrackedStory> = self
            .stories
            .values()
            .filter(|s| &s.context == context)
            .collect();
        stories.sort_by(|a, b| {
            b.last_updated_at
                .cmp(&a.last_updated_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        stories
    }

    fn membership_row(&self, story_id: &str, article_id: &str) -> Option<StoryMembership> {
        self.memberships
            .get(story_id)?
            .iter()
            .find(|m| m.article_id == article_id)
            .cloned()
    }

    fn create_story(&mut self, story: TrackedStory) -> TrackedStory {
        // Creation conflicts merge into the earlier story rather than
        // producing a second one for the same article.
        for existing in self.context_stories(&story.context) {
            if story.member_article_ids.iter().any(|id| existing.contains(id)) {
                debug!(
                    story_id = %existing.story_id,
                    context = %story.context,
                    "story creation merged into existing story"
                );
                return existing.clone();
            }
        }

        let rows = story
            .member_article_ids
            .iter()
            .map(|id| StoryMembership {
                story_id: story.story_id.clone(),
                article_id: id.clone(),
                added_at: story.created_at,
            })
            .collect();
        self.memberships.insert(story.story_id.clone(), rows);
        self.stories.insert(story.story_id.clone(), story.clone());
        story
    }

    fn add_member(
        &mut self,
        story_id: &str,
        article_id: &str,
        added_at: DateTime<Utc>,
    ) -> Result<MembershipInsert> {
        let context = self
            .stories
            .get(story_id)
            .map(|s| s.context.clone())
            .ok_or_else(|| Error::Storage(format!("no story with id {}", story_id)))?;

        // Uniqueness on (context, article id): an article already attached
        // anywhere in the context is not linked a second time.
        for existing in self.context_stories(&context) {
            if existing.contains(article_id) {
                let row = self
                    .membership_row(&existing.story_id, article_id)
                    .ok_or_else(|| {
                        Error::Storage(format!(
                            "story {} lists {} without a membership row",
                            existing.story_id, article_id
                        ))
                    })?;
                return Ok(MembershipInsert::AlreadyPresent(row));
            }
        }

        let story = self
            .stories
            .get_mut(story_id)
            .ok_or_else(|| Error::Storage(format!("no story with id {}", story_id)))?;
        story.member_article_ids.push(article_id.to_string());
        // Monotonic bump; a stale timestamp never moves the story backwards.
        if added_at > story.last_updated_at {
            story.last_updated_at = added_at;
        }
        let row = StoryMembership {
            story_id: story_id.to_string(),
            article_id: article_id.to_string(),
            added_at,
        };
        self.memberships
            .entry(story_id.to_string())
            .or_default()
            .push(row.clone());
        Ok(MembershipInsert::Inserted(row))
    }
}

pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleStore for MemoryStorage {
    async fn store_article(&self, article: &Article) -> Result<()> {
        let mut store = self.store.write().await;
        store.articles.insert(article.id.clone(), article.clone());
        Ok(())
    }

    async fn get_article(&self, article_id: &str) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.articles.get(article_id).cloned())
    }
}

#[async_trait]
impl SummaryStore for MemoryStorage {
    async fn get_summary(&self, fingerprint: &Fingerprint) -> Result<Option<SummaryRecord>> {
        let store = self.store.read().await;
        Ok(store.summaries.get(fingerprint).cloned())
    }

    async fn put_summary_if_absent(&self, record: SummaryRecord) -> Result<SummaryRecord> {
        let mut store = self.store.write().await;
        Ok(store
            .summaries
            .entry(record.fingerprint.clone())
            .or_insert(record)
            .clone())
    }
}

#[async_trait]
impl StoryStore for MemoryStorage {
    async fn stories_for_context(&self, context: &TrackingContext) -> Result<Vec<TrackedStory>> {
        let store = self.store.read().await;
        Ok(store
            .context_stories(context)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn stories_for_owner(&self, owner: &str) -> Result<Vec<TrackedStory>> {
        let store = self.store.read().await;
        let mut stories: Vec<TrackedStory> = store
            .stories
            .values()
            .filter(|s| s.context.owner == owner)
            .cloned()
            .collect();
        stories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(stories)
    }

    async fn get_story(&self, story_id: &str) -> Result<Option<TrackedStory>> {
        let store = self.store.read().await;
        Ok(store.stories.get(story_id).cloned())
    }

    async fn create_story(&self, story: TrackedStory) -> Result<TrackedStory> {
        let mut store = self.store.write().await;
        Ok(store.create_story(story))
    }

    async fn add_member(
        &self,
        story_id: &str,
        article_id: &str,
        added_at: DateTime<Utc>,
    ) -> Result<MembershipInsert> {
        let mut store = self.store.write().await;
        store.add_member(story_id, article_id, added_at)
    }

    async fn membership_for_article(
        &self,
        context: &TrackingContext,
        article_id: &str,
    ) -> Result<Option<StoryMembership>> {
        let store = self.store.read().await;
        for story in store.context_stories(context) {
            if story.contains(article_id) {
                return Ok(store.membership_row(&story.story_id, article_id));
            }
        }
        Ok(None)
    }

    async fn delete_story(&self, owner: &str, story_id: &str) -> Result<bool> {
        let mut store = self.store.write().await;
        let owned = store
            .stories
            .get(story_id)
            .map(|s| s.context.owner == owner)
            .unwrap_or(false);
        if !owned {
            return Ok(false);
        }
        store.stories.remove(story_id);
        // Memberships cascade with their story.
        store.memberships.remove(story_id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use nl_core::SummaryStyle;

    fn article(id: &str) -> Article {
        Article {
            id: id.to_string(),
            source_url: format!("https://example.com/news/{}", id),
            title: format!("Article {}", id),
            body_text: "This is a test article about politics.".to_string(),
            published_at: Utc::now(),
            fetched_at: Utc::now(),
        }
    }

    fn story(id: &str, context: &TrackingContext, member: &str) -> TrackedStory {
        let now = Utc::now();
        TrackedStory {
            story_id: id.to_string(),
            context: context.clone(),
            created_at: now,
            last_updated_at: now,
            member_article_ids: vec![member.to_string()],
        }
    }

    #[tokio::test]
    async fn test_summary_put_if_absent_keeps_first_record() {
        let storage = MemoryStorage::new();
        let fingerprint = Fingerprint::compute("a1", SummaryStyle::Default);
        let first = SummaryRecord {
            fingerprint: fingerprint.clone(),
            summary_text: "first".to_string(),
            generated_at: Utc::now(),
            source_article_id: "a1".to_string(),
            style: SummaryStyle::Default,
        };
        let mut second = first.clone();
        second.summary_text = "second".to_string();

        let stored = storage.put_summary_if_absent(first).await.unwrap();
        assert_eq!(stored.summary_text, "first");
        let stored = storage.put_summary_if_absent(second).await.unwrap();
        assert_eq!(stored.summary_text, "first");

        let found = storage.get_summary(&fingerprint).await.unwrap().unwrap();
        assert_eq!(found.summary_text, "first");
    }

    #[tokio::test]
    async fn test_membership_uniqueness_per_context() {
        let storage = MemoryStorage::new();
        let context = TrackingContext::new("user-1", "elections");
        storage
            .create_story(story("s1", &context, "a1"))
            .await
            .unwrap();
        storage
            .create_story(story("s2", &context, "a2"))
            .await
            .unwrap();

        // a1 is already attached to s1; linking it to s2 is a no-op.
        let insert = storage.add_member("s2", "a1", Utc::now()).await.unwrap();
        assert!(matches!(insert, MembershipInsert::AlreadyPresent(ref m) if m.story_id == "s1"));

        let insert = storage.add_member("s2", "a3", Utc::now()).await.unwrap();
        assert!(matches!(insert, MembershipInsert::Inserted(_)));
    }

    #[tokio::test]
    async fn test_create_story_merges_duplicate_initial_member() {
        let storage = MemoryStorage::new();
        let context = TrackingContext::new("user-1", "elections");
        let first = storage
            .create_story(story("s1", &context, "a1"))
            .await
            .unwrap();
        let merged = storage
            .create_story(story("s2", &context, "a1"))
            .await
            .unwrap();
        assert_eq!(merged.story_id, first.story_id);
        assert!(storage.get_story("s2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_updated_never_moves_backwards() {
        let storage = MemoryStorage::new();
        let context = TrackingContext::new("user-1", "elections");
        storage
            .create_story(story("s1", &context, "a1"))
            .await
            .unwrap();

        let future = Utc::now() + Duration::seconds(60);
        storage.add_member("s1", "a2", future).await.unwrap();
        let stale = Utc::now() - Duration::seconds(60);
        storage.add_member("s1", "a3", stale).await.unwrap();

        let story = storage.get_story("s1").await.unwrap().unwrap();
        assert_eq!(story.last_updated_at, future);
        assert_eq!(story.member_article_ids, vec!["a1", "a2", "a3"]);
    }

    #[tokio::test]
    async fn test_delete_story_cascades_memberships() {
        let storage = MemoryStorage::new();
        let context = TrackingContext::new("user-1", "elections");
        storage
            .create_story(story("s1", &context, "a1"))
            .await
            .unwrap();

        // Wrong owner does not delete.
        assert!(!storage.delete_story("user-2", "s1").await.unwrap());
        assert!(storage.delete_story("user-1", "s1").await.unwrap());
        assert!(storage.get_story("s1").await.unwrap().is_none());
        assert!(storage
            .membership_for_article(&context, "a1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_article_round_trip() {
        let storage = MemoryStorage::new();
        let a = article("a1");
        storage.store_article(&a).await.unwrap();
        let found = storage.get_article("a1").await.unwrap().unwrap();
        assert_eq!(found.title, a.title);
        assert!(storage.get_article("missing").await.unwrap().is_none());
    }
}
