use std::sync::Arc;

use nl_core::{
    Article, Result, StoryStore, Summarizer, SummaryRecord, SummaryStyle, TrackedStory,
    TrackingContext,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::SummaryCache;
use crate::clustering::{AssignmentDisposition, StoryAssignment, StoryClusteringEngine};

/// Outcome of one half of `process_article`. Summarization and story
/// assignment are independent, so one can fail while the other lands.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status", content = "value")]
pub enum PartOutcome<T> {
    Succeeded(T),
    Failed(String),
}

impl<T> PartOutcome<T> {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, PartOutcome::Succeeded(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            PartOutcome::Succeeded(value) => Some(value),
            PartOutcome::Failed(_) => None,
        }
    }
}

impl<T> From<Result<T>> for PartOutcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => PartOutcome::Succeeded(value),
            Err(e) => PartOutcome::Failed(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub summary: PartOutcome<SummaryRecord>,
    pub story: PartOutcome<StoryAssignment>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ContextUpdate {
    pub stories_updated: usize,
    pub new_articles: usize,
}

/// Entry point for ingestion callers: summarize and cluster in one call.
pub struct TrackingCoordinator {
    cache: SummaryCache,
    engine: StoryClusteringEngine,
    summarizer: Arc<dyn Summarizer>,
    stories: Arc<dyn StoryStore>,
}

impl TrackingCoordinator {
    pub fn new(
        cache: SummaryCache,
        engine: StoryClusteringEngine,
        summarizer: Arc<dyn Summarizer>,
        stories: Arc<dyn StoryStore>,
    ) -> Self {
        Self {
            cache,
            engine,
            summarizer,
            stories,
        }
    }

    /// Run an article through the summary cache and the clustering
    /// engine. The two halves run concurrently and report per-part
    /// outcomes; only input validation fails the call as a whole.
    pub async fn process_article(
        &self,
        article: &Article,
        style: SummaryStyle,
        context: &TrackingContext,
    ) -> Result<ProcessOutcome> {
        article.validate()?;

        let (summary, story) = tokio::join!(
            self.cache
                .get_or_compute(article, style, self.summarizer.as_ref()),
            self.engine.assign(article, context),
        );

        if let Err(e) = &summary {
            warn!(article_id = %article.id, error = %e, "summarization failed");
        }
        if let Err(e) = &story {
            warn!(article_id = %article.id, error = %e, "story assignment failed");
        }

        Ok(ProcessOutcome {
            summary: summary.into(),
            story: story.into(),
        })
    }

    /// Re-run assignment for a batch of articles within one tracking
    /// context, e.g. after a scheduled fetch for the context's keyword.
    pub async fn update_context(
        &self,
        context: &TrackingContext,
        articles: &[Article],
    ) -> Result<ContextUpdate> {
        let mut updated_stories = Vec::new();
        let mut update = ContextUpdate::default();

        for article in articles {
            let assignment = self.engine.assign(article, context).await?;
            match assignment.disposition {
                AssignmentDisposition::AlreadyAssigned => {}
                AssignmentDisposition::Created | AssignmentDisposition::Joined => {
                    update.new_articles += 1;
                    if !updated_stories.contains(&assignment.story.story_id) {
                        updated_stories.push(assignment.story.story_id);
                    }
                }
            }
        }

        update.stories_updated = updated_stories.len();
        info!(
            context = %context,
            stories_updated = update.stories_updated,
            new_articles = update.new_articles,
            "context update complete"
        );
        Ok(update)
    }

    pub async fn stories_for_owner(&self, owner: &str) -> Result<Vec<TrackedStory>> {
        self.stories.stories_for_owner(owner).await
    }

    pub async fn story_details(&self, story_id: &str) -> Result<Option<TrackedStory>> {
        self.stories.get_story(story_id).await
    }

    pub async fn delete_story(&self, owner: &str, story_id: &str) -> Result<bool> {
        self.stories.delete_story(owner, story_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use nl_core::{Error, Similarity};
    use nl_storage::MemoryStorage;
    use crate::config::TrackingConfig;

    struct FixedSummarizer;

    #[async_trait]
    impl Summarizer for FixedSummarizer {
        fn name(&self) -> &str {
            "Fixed"
        }

        async fn summarize(&self, _body_text: &str, style: SummaryStyle) -> Result<String> {
            Ok(format!("summary in {} style", style))
        }
    }

    struct BrokenSummarizer;

    #[async_trait]
    impl Summarizer for BrokenSummarizer {
        fn name(&self) -> &str {
            "Broken"
        }

        async fn summarize(&self, _body_text: &str, _style: SummaryStyle) -> Result<String> {
            Err(Error::Compute("model timed out".to_string()))
        }
    }

    struct StubSimilarity(f32);

    #[async_trait]
    impl Similarity for StubSimilarity {
        fn name(&self) -> &str {
            "Stub"
        }

        async fn score(&self, a: &Article, b: &Article) -> Result<f32> {
            if a.id == b.id {
                return Ok(1.0);
            }
            Ok(self.0)
        }
    }

    fn article(id: &str) -> Article {
        Article {
            id: id.to_string(),
            source_url: format!("https://example.com/news/{}", id),
            title: format!("Article {}", id),
            body_text: "The election results were announced late last night.".to_string(),
            published_at: Utc::now(),
            fetched_at: Utc::now(),
        }
    }

    fn coordinator(
        summarizer: Arc<dyn Summarizer>,
        similarity: Arc<dyn Similarity>,
    ) -> TrackingCoordinator {
        let storage = Arc::new(MemoryStorage::new());
        let cache = SummaryCache::new(storage.clone());
        let engine = StoryClusteringEngine::new(
            storage.clone(),
            storage.clone(),
            similarity,
            TrackingConfig::default(),
        )
        .unwrap();
        TrackingCoordinator::new(cache, engine, summarizer, storage)
    }

    #[tokio::test]
    async fn test_process_article_full_success() {
        let coordinator =
            coordinator(Arc::new(FixedSummarizer), Arc::new(StubSimilarity(0.9)));
        let context = TrackingContext::new("user-1", "elections");

        let outcome = coordinator
            .process_article(&article("a1"), SummaryStyle::Default, &context)
            .await
            .unwrap();

        assert!(outcome.summary.is_succeeded());
        let assignment = outcome.story.ok().unwrap();
        assert_eq!(assignment.disposition, AssignmentDisposition::Created);
    }

    #[tokio::test]
    async fn test_partial_success_when_summarizer_fails() {
        let coordinator =
            coordinator(Arc::new(BrokenSummarizer), Arc::new(StubSimilarity(0.9)));
        let context = TrackingContext::new("user-1", "elections");

        let outcome = coordinator
            .process_article(&article("a1"), SummaryStyle::Default, &context)
            .await
            .unwrap();

        assert!(!outcome.summary.is_succeeded());
        assert!(outcome.story.is_succeeded());
    }

    #[tokio::test]
    async fn test_invalid_article_fails_whole_call() {
        let coordinator =
            coordinator(Arc::new(FixedSummarizer), Arc::new(StubSimilarity(0.9)));
        let context = TrackingContext::new("user-1", "elections");
        let mut a = article("a1");
        a.body_text = String::new();

        let result = coordinator
            .process_article(&a, SummaryStyle::Default, &context)
            .await;
        assert!(matches!(result, Err(Error::InvalidArticle(_))));
    }

    #[tokio::test]
    async fn test_update_context_counts() {
        let coordinator =
            coordinator(Arc::new(FixedSummarizer), Arc::new(StubSimilarity(0.9)));
        let context = TrackingContext::new("user-1", "elections");

        let batch = [article("a1"), article("a2"), article("a1")];
        let update = coordinator.update_context(&context, &batch).await.unwrap();
        // a1 creates, a2 joins, the repeated a1 is a no-op.
        assert_eq!(update.new_articles, 2);
        assert_eq!(update.stories_updated, 1);

        let stories = coordinator.stories_for_owner("user-1").await.unwrap();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].member_article_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_pipeline_with_real_collaborators() {
        use nl_inference::similarity::KeywordSimilarity;
        use nl_inference::summarizers::DummySummarizer;

        let coordinator =
            coordinator(Arc::new(DummySummarizer), Arc::new(KeywordSimilarity));
        let context = TrackingContext::new("user-1", "elections");

        let mut a = article("a1");
        a.body_text = "The election results were contested by both major parties.".to_string();
        let mut b = article("a2");
        b.body_text = a.body_text.clone();

        let first = coordinator
            .process_article(&a, SummaryStyle::Default, &context)
            .await
            .unwrap();
        let second = coordinator
            .process_article(&b, SummaryStyle::Default, &context)
            .await
            .unwrap();

        assert!(first.summary.is_succeeded());
        // Identical bodies score 1.0 under keyword overlap and share a story.
        let first_story = first.story.ok().unwrap().story;
        let second_story = second.story.ok().unwrap().story;
        assert_eq!(first_story.story_id, second_story.story_id);
        assert_eq!(second_story.member_article_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_story_read_and_delete() {
        let coordinator =
            coordinator(Arc::new(FixedSummarizer), Arc::new(StubSimilarity(0.9)));
        let context = TrackingContext::new("user-1", "elections");

        let outcome = coordinator
            .process_article(&article("a1"), SummaryStyle::Default, &context)
            .await
            .unwrap();
        let story_id = outcome.story.ok().unwrap().story.story_id;

        let details = coordinator.story_details(&story_id).await.unwrap().unwrap();
        assert_eq!(details.member_article_ids, vec!["a1"]);

        assert!(coordinator.delete_story("user-1", &story_id).await.unwrap());
        assert!(coordinator.story_details(&story_id).await.unwrap().is_none());
    }
}
