use std::sync::Arc;

use chrono::Utc;
use nl_core::{
    Article, ArticleStore, Error, MembershipInsert, Result, Similarity, StoryStore, TrackedStory,
    TrackingContext,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::TrackingConfig;
use crate::locks::KeyedLocks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentDisposition {
    /// The article started a new story.
    Created,
    /// The article joined an existing story.
    Joined,
    /// The article was already a member; nothing changed.
    AlreadyAssigned,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoryAssignment {
    pub story: TrackedStory,
    pub disposition: AssignmentDisposition,
}

/// Assigns incoming articles to tracked stories, one tracking context at
/// a time. Assignment decisions for a context are serialized through a
/// per-context lock so concurrent first-articles cannot race two stories
/// into existence.
pub struct StoryClusteringEngine {
    stories: Arc<dyn StoryStore>,
    articles: Arc<dyn ArticleStore>,
    similarity: Arc<dyn Similarity>,
    config: TrackingConfig,
    context_locks: KeyedLocks<TrackingContext>,
}

impl StoryClusteringEngine {
    pub fn new(
        stories: Arc<dyn StoryStore>,
        articles: Arc<dyn ArticleStore>,
        similarity: Arc<dyn Similarity>,
        config: TrackingConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            stories,
            articles,
            similarity,
            config,
            context_locks: KeyedLocks::new(),
        })
    }

    pub async fn assign(
        &self,
        article: &Article,
        context: &TrackingContext,
    ) -> Result<StoryAssignment> {
        article.validate()?;
        let guard = self.context_locks.acquire(context).await;
        let result = self.assign_locked(article, context).await;
        drop(guard);
        self.context_locks.release(context).await;
        result
    }

    async fn assign_locked(
        &self,
        article: &Article,
        context: &TrackingContext,
    ) -> Result<StoryAssignment> {
        self.articles.store_article(article).await?;

        // Idempotence: a resubmitted article keeps its existing assignment.
        if let Some(membership) = self
            .stories
            .membership_for_article(context, &article.id)
            .await?
        {
            debug!(
                article_id = %article.id,
                story_id = %membership.story_id,
                "article already assigned"
            );
            let story = self.fetch_story(&membership.story_id).await?;
            return Ok(StoryAssignment {
                story,
                disposition: AssignmentDisposition::AlreadyAssigned,
            });
        }

        // Candidates arrive most recently updated first, so a strictly
        // greater comparison keeps the more recent story on score ties.
        let candidates = self.stories.stories_for_context(context).await?;
        let mut best: Option<(&TrackedStory, f32)> = None;
        for candidate in &candidates {
            if let Some(score) = self.score_candidate(article, candidate).await {
                if best.map(|(_, b)| score > b).unwrap_or(true) {
                    best = Some((candidate, score));
                }
            }
        }

        if let Some((story, score)) = best {
            if score >= self.config.similarity_threshold {
                return self.join_story(article, &story.story_id, score).await;
            }
            debug!(
                article_id = %article.id,
                best_score = score,
                threshold = self.config.similarity_threshold,
                "no story above threshold"
            );
        }

        self.create_story(article, context).await
    }

    /// Max similarity between the article and the story's representative
    /// set (its most recent members, bounded by configuration). `None`
    /// means the candidate could not be scored and is treated as
    /// non-matching.
    async fn score_candidate(&self, article: &Article, story: &TrackedStory) -> Option<f32> {
        let recent = story
            .member_article_ids
            .iter()
            .rev()
            .take(self.config.representative_set_size);

        let mut best: Option<f32> = None;
        for member_id in recent {
            let member = match self.articles.get_article(member_id).await {
                Ok(Some(member)) => member,
                Ok(None) => {
                    warn!(
                        story_id = %story.story_id,
                        article_id = %member_id,
                        "member article missing from store"
                    );
                    continue;
                }
                Err(e) => {
                    warn!(story_id = %story.story_id, error = %e, "member lookup failed");
                    return None;
                }
            };
            match self.similarity.score(article, &member).await {
                Ok(score) => best = Some(best.map_or(score, |b| b.max(score))),
                Err(e) => {
                    warn!(
                        story_id = %story.story_id,
                        engine = self.similarity.name(),
                        error = %e,
                        "similarity unavailable, treating candidate as non-matching"
                    );
                    return None;
                }
            }
        }
        best
    }

    async fn join_story(
        &self,
        article: &Article,
        story_id: &str,
        score: f32,
    ) -> Result<StoryAssignment> {
        match self
            .stories
            .add_member(story_id, &article.id, Utc::now())
            .await?
        {
            MembershipInsert::Inserted(_) => {
                info!(article_id = %article.id, story_id = %story_id, score, "article joined story");
                let story = self.fetch_story(story_id).await?;
                Ok(StoryAssignment {
                    story,
                    disposition: AssignmentDisposition::Joined,
                })
            }
            MembershipInsert::AlreadyPresent(row) => {
                let story = self.fetch_story(&row.story_id).await?;
                Ok(StoryAssignment {
                    story,
                    disposition: AssignmentDisposition::AlreadyAssigned,
                })
            }
        }
    }

    async fn create_story(
        &self,
        article: &Article,
        context: &TrackingContext,
    ) -> Result<StoryAssignment> {
        let now = Utc::now();
        let story_id = Uuid::new_v4().to_string();
        let story = TrackedStory {
            story_id: story_id.clone(),
            context: context.clone(),
            created_at: now,
            last_updated_at: now,
            member_article_ids: vec![article.id.clone()],
        };
        let canonical = self.stories.create_story(story).await?;
        let disposition = if canonical.story_id == story_id {
            info!(article_id = %article.id, story_id = %story_id, context = %context, "created story");
            AssignmentDisposition::Created
        } else {
            // The store merged the insert into an earlier story holding
            // this article.
            info!(
                article_id = %article.id,
                story_id = %canonical.story_id,
                "story creation merged into existing story"
            );
            AssignmentDisposition::AlreadyAssigned
        };
        Ok(StoryAssignment {
            story: canonical,
            disposition,
        })
    }

    async fn fetch_story(&self, story_id: &str) -> Result<TrackedStory> {
        self.stories
            .get_story(story_id)
            .await?
            .ok_or_else(|| Error::Storage(format!("story {} disappeared", story_id)))
    }
}
