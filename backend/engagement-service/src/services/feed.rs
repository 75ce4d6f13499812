use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::domain::{Feed, FeedRequest, FeedTag, Post, PostWithOwner};
use crate::error::{ServiceError, ServiceResult};
use crate::metrics::{FEED_POSTS_RETURNED, FEED_REQUEST_TOTAL};
use crate::repository::{DocumentStore, PostFilter, PostSort};
use crate::services::populate::populate_owners;

fn actor_for(tag: FeedTag, actor: Option<Uuid>) -> ServiceResult<Uuid> {
    actor.ok_or_else(|| {
        ServiceError::Validation(format!("tag '{}' requires an authenticated user", tag))
    })
}

/// Builds the per-tag post lists shown on the home screen.
#[derive(Clone)]
pub struct FeedAggregator {
    store: Arc<dyn DocumentStore>,
    config: FeedConfig,
}

impl FeedAggregator {
    pub fn new(store: Arc<dyn DocumentStore>, config: FeedConfig) -> Self {
        Self { store, config }
    }

    /// Resolve the effective limit: default when absent, clamped to the max.
    fn effective_limit(&self, requested: Option<usize>) -> ServiceResult<usize> {
        match requested {
            None => Ok(self.config.default_limit),
            Some(0) => Err(ServiceError::Validation(
                "limit must be greater than zero".to_string(),
            )),
            Some(n) if n > self.config.max_limit => {
                debug!(
                    requested = n,
                    max_limit = self.config.max_limit,
                    "feed limit clamped"
                );
                Ok(self.config.max_limit)
            }
            Some(n) => Ok(n),
        }
    }

    pub async fn get_feed(&self, request: FeedRequest) -> ServiceResult<Feed> {
        let limit = self.effective_limit(request.limit)?;

        // Reject before any store call.
        for tag in request.tags.iter().filter(|t| t.needs_actor()) {
            actor_for(*tag, request.actor)?;
        }

        let mut feed = Feed::new();
        for tag in request.tags {
            let posts = match tag {
                FeedTag::Random => self.random(limit).await?,
                FeedTag::Following => {
                    self.following(actor_for(tag, request.actor)?, limit)
                        .await?
                }
                FeedTag::MyPosts => self.my_posts(actor_for(tag, request.actor)?).await?,
            };

            FEED_REQUEST_TOTAL.with_label_values(&[tag.as_str()]).inc();
            FEED_POSTS_RETURNED
                .with_label_values(&[tag.as_str()])
                .observe(posts.len() as f64);
            debug!(tag = tag.as_str(), count = posts.len(), "feed tag computed");

            feed.insert(tag, posts);
        }

        Ok(feed)
    }

    /// Sample first, then order the sample newest first.
    async fn random(&self, limit: usize) -> ServiceResult<Vec<PostWithOwner>> {
        let mut posts = self.store.sample_posts(limit).await?;
        PostSort::NewestFirst.apply(&mut posts);
        posts.truncate(limit);
        self.enrich(posts).await
    }

    async fn following(&self, actor_id: Uuid, limit: usize) -> ServiceResult<Vec<PostWithOwner>> {
        let actor = self
            .store
            .find_user(actor_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", actor_id))?;

        let followed = actor.followed_user_ids();
        if followed.is_empty() {
            return Ok(vec![]);
        }

        let posts = self
            .store
            .find_posts(PostFilter::OwnerIn(followed), PostSort::NewestFirst, Some(limit))
            .await?;
        self.enrich(posts).await
    }

    async fn my_posts(&self, actor_id: Uuid) -> ServiceResult<Vec<PostWithOwner>> {
        let posts = self
            .store
            .find_posts(PostFilter::Owner(actor_id), PostSort::NewestFirst, None)
            .await?;
        self.enrich(posts).await
    }

    async fn enrich(&self, posts: Vec<Post>) -> ServiceResult<Vec<PostWithOwner>> {
        populate_owners(self.store.as_ref(), posts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    fn aggregator() -> FeedAggregator {
        FeedAggregator::new(Arc::new(MemoryStore::new()), FeedConfig::default())
    }

    #[test]
    fn limit_defaults_and_clamps() {
        let feed = aggregator();
        assert_eq!(feed.effective_limit(None).unwrap(), 8);
        assert_eq!(feed.effective_limit(Some(3)).unwrap(), 3);
        assert_eq!(feed.effective_limit(Some(10_000)).unwrap(), 100);
        assert!(matches!(
            feed.effective_limit(Some(0)),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn limit_above_configured_max_is_clamped() {
        let feed = FeedAggregator::new(
            Arc::new(MemoryStore::new()),
            FeedConfig {
                default_limit: 2,
                max_limit: 5,
            },
        );
        assert_eq!(feed.effective_limit(Some(5)).unwrap(), 5);
        assert_eq!(feed.effective_limit(Some(6)).unwrap(), 5);
    }

    #[tokio::test]
    async fn actor_scoped_tag_without_actor_is_rejected() {
        let feed = aggregator();
        let err = feed
            .get_feed(FeedRequest::new([FeedTag::Random, FeedTag::MyPosts]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("myPosts")));
    }

    #[tokio::test]
    async fn random_on_empty_store_is_empty() {
        let feed = aggregator();
        let result = feed
            .get_feed(FeedRequest::new([FeedTag::Random]).limit(5))
            .await
            .unwrap();
        assert!(result[&FeedTag::Random].is_empty());
    }
}
