//! Document-store seam used by the engagement engine.
//!
//! The engine only needs single-document atomic set operations on embedded
//! relation lists, a handful of filtered reads and bulk deletes. Two
//! implementations ship: [`MemoryStore`] and [`PgDocumentStore`].

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Comment, Post, RelationField, RelationValue, User};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Value does not belong to {0}")]
    RelationMismatch(RelationField),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a single-document update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    /// The target document exists
    pub matched: bool,
    /// The document was changed (false for duplicate add / absent remove)
    pub modified: bool,
}

impl UpdateOutcome {
    pub fn unmatched() -> Self {
        Self::default()
    }

    pub fn matched(modified: bool) -> Self {
        Self {
            matched: true,
            modified,
        }
    }
}

/// Predicate for post queries
#[derive(Debug, Clone, PartialEq)]
pub enum PostFilter {
    Owner(Uuid),
    OwnerIn(Vec<Uuid>),
    IdIn(Vec<Uuid>),
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::Owner(owner) => post.owner == *owner,
            PostFilter::OwnerIn(owners) => owners.contains(&post.owner),
            PostFilter::IdIn(ids) => ids.contains(&post.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSort {
    /// `created_at` descending, ties broken by id
    #[default]
    NewestFirst,
}

impl PostSort {
    pub fn apply(&self, posts: &mut [Post]) {
        match self {
            PostSort::NewestFirst => posts.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            }),
        }
    }
}

/// Document store consumed by the engine.
///
/// Every mutation is atomic on a single document. Nothing here spans two
/// documents, so callers that keep two mirrors in sync issue two calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_user(&self, user: User) -> StoreResult<()>;

    async fn insert_post(&self, post: Post) -> StoreResult<()>;

    async fn insert_comment(&self, comment: Comment) -> StoreResult<()>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Batch lookup; missing ids are silently skipped
    async fn find_users(&self, ids: Vec<Uuid>) -> StoreResult<Vec<User>>;

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>>;

    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>>;

    /// Add `value` to `field` of document `owner_id` unless an entry with the
    /// same key is already present.
    async fn set_add(
        &self,
        field: RelationField,
        owner_id: Uuid,
        value: RelationValue,
    ) -> StoreResult<UpdateOutcome>;

    /// Remove the entry keyed by `key` from `field` of document `owner_id`.
    async fn set_remove(
        &self,
        field: RelationField,
        owner_id: Uuid,
        key: Uuid,
    ) -> StoreResult<UpdateOutcome>;

    /// `None` when the owning document does not exist
    async fn set_contains(
        &self,
        field: RelationField,
        owner_id: Uuid,
        key: Uuid,
    ) -> StoreResult<Option<bool>>;

    /// Remove the entry keyed by `key` from `field` in every document of the
    /// collection. Returns the number of documents changed.
    async fn set_remove_everywhere(&self, field: RelationField, key: Uuid) -> StoreResult<u64>;

    /// Up to `size` posts drawn uniformly at random, in no particular order
    async fn sample_posts(&self, size: usize) -> StoreResult<Vec<Post>>;

    async fn find_posts(
        &self,
        filter: PostFilter,
        sort: PostSort,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Post>>;

    async fn find_comment_ids_by_post(&self, post_id: Uuid) -> StoreResult<Vec<Uuid>>;

    async fn delete_comments_by_post(&self, post_id: Uuid) -> StoreResult<u64>;

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool>;

    async fn delete_post(&self, id: Uuid) -> StoreResult<bool>;

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn newest_first_breaks_ties_deterministically() {
        let owner = Uuid::new_v4();
        let at = Utc::now();
        let mut posts = vec![
            Post::new(owner, "a", "").with_created_at(at - Duration::minutes(5)),
            Post::new(owner, "b", "").with_created_at(at),
            Post::new(owner, "c", "").with_created_at(at),
        ];

        PostSort::NewestFirst.apply(&mut posts);

        assert_eq!(posts[2].title, "a");
        assert!(posts[0].id > posts[1].id);
    }

    #[test]
    fn owner_in_filter() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let filter = PostFilter::OwnerIn(vec![a]);

        assert!(filter.matches(&Post::new(a, "t", "d")));
        assert!(!filter.matches(&Post::new(b, "t", "d")));
        assert!(!PostFilter::OwnerIn(vec![]).matches(&Post::new(a, "t", "d")));
    }
}
