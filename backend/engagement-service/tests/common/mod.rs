//! Shared fixtures for engagement-service integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashSet;
use std::sync::Arc;
use uuid::Uuid;

use engagement_service::domain::{Comment, Post, RelationField, RelationValue, User};
use engagement_service::repository::{
    DocumentStore, MemoryStore, PostFilter, PostSort, StoreError, StoreResult, UpdateOutcome,
};

/// A memory store with a handful of users already inserted
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub alice: Uuid,
    pub bob: Uuid,
    pub carol: Uuid,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let alice = insert_user(&store, "Alice", "alice").await;
        let bob = insert_user(&store, "Bob", "bob").await;
        let carol = insert_user(&store, "Carol", "carol").await;
        Self {
            store,
            alice,
            bob,
            carol,
        }
    }

    pub async fn post(&self, owner: Uuid, title: &str) -> Uuid {
        self.post_at(owner, title, Utc::now()).await
    }

    pub async fn post_at(&self, owner: Uuid, title: &str, at: DateTime<Utc>) -> Uuid {
        let post = Post::new(owner, title, format!("{} body", title)).with_created_at(at);
        let id = post.id;
        self.store.insert_post(post).await.expect("insert post");
        id
    }

    /// `count` posts by `owner`, one minute apart, oldest first
    pub async fn posts_by(&self, owner: Uuid, count: usize) -> Vec<Uuid> {
        let base = Utc::now() - Duration::hours(1);
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let at = base + Duration::minutes(i as i64);
            ids.push(self.post_at(owner, &format!("post-{}", i), at).await);
        }
        ids
    }

    pub async fn comment(&self, owner: Uuid, post: Uuid, content: &str) -> Uuid {
        let comment = Comment::new(owner, post, content);
        let id = comment.id;
        self.store
            .insert_comment(comment)
            .await
            .expect("insert comment");
        id
    }

    pub async fn user(&self, id: Uuid) -> User {
        self.store
            .find_user(id)
            .await
            .expect("find user")
            .expect("user exists")
    }

    pub async fn find_post(&self, id: Uuid) -> Option<Post> {
        self.store.find_post(id).await.expect("find post")
    }
}

pub async fn insert_user(store: &MemoryStore, name: &str, handle: &str) -> Uuid {
    let user = User::new(name, handle);
    let id = user.id;
    store.insert_user(user).await.expect("insert user");
    id
}

/// Wraps a [`MemoryStore`] and fails set writes on selected relation fields.
pub struct FailingStore {
    inner: Arc<MemoryStore>,
    failing: DashSet<RelationField>,
}

impl FailingStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            failing: DashSet::new(),
        }
    }

    pub fn fail_on(&self, field: RelationField) {
        self.failing.insert(field);
    }

    pub fn heal(&self) {
        self.failing.clear();
    }

    fn check(&self, field: RelationField) -> StoreResult<()> {
        if self.failing.contains(&field) {
            return Err(StoreError::Unavailable(format!("injected failure on {}", field)));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        self.inner.insert_user(user).await
    }

    async fn insert_post(&self, post: Post) -> StoreResult<()> {
        self.inner.insert_post(post).await
    }

    async fn insert_comment(&self, comment: Comment) -> StoreResult<()> {
        self.inner.insert_comment(comment).await
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.find_user(id).await
    }

    async fn find_users(&self, ids: Vec<Uuid>) -> StoreResult<Vec<User>> {
        self.inner.find_users(ids).await
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        self.inner.find_post(id).await
    }

    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        self.inner.find_comment(id).await
    }

    async fn set_add(
        &self,
        field: RelationField,
        owner_id: Uuid,
        value: RelationValue,
    ) -> StoreResult<UpdateOutcome> {
        self.check(field)?;
        self.inner.set_add(field, owner_id, value).await
    }

    async fn set_remove(
        &self,
        field: RelationField,
        owner_id: Uuid,
        key: Uuid,
    ) -> StoreResult<UpdateOutcome> {
        self.check(field)?;
        self.inner.set_remove(field, owner_id, key).await
    }

    async fn set_contains(
        &self,
        field: RelationField,
        owner_id: Uuid,
        key: Uuid,
    ) -> StoreResult<Option<bool>> {
        self.inner.set_contains(field, owner_id, key).await
    }

    async fn set_remove_everywhere(&self, field: RelationField, key: Uuid) -> StoreResult<u64> {
        self.check(field)?;
        self.inner.set_remove_everywhere(field, key).await
    }

    async fn sample_posts(&self, size: usize) -> StoreResult<Vec<Post>> {
        self.inner.sample_posts(size).await
    }

    async fn find_posts(
        &self,
        filter: PostFilter,
        sort: PostSort,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Post>> {
        self.inner.find_posts(filter, sort, limit).await
    }

    async fn find_comment_ids_by_post(&self, post_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.inner.find_comment_ids_by_post(post_id).await
    }

    async fn delete_comments_by_post(&self, post_id: Uuid) -> StoreResult<u64> {
        self.inner.delete_comments_by_post(post_id).await
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_comment(id).await
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_post(id).await
    }
}
