//! In-process document store.
//!
//! Each collection is a `DashMap`; a mutation holds the shard lock of the one
//! document it touches, which gives the same single-document atomicity the
//! PostgreSQL store gets from row locks.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rand::seq::SliceRandom;
use uuid::Uuid;

use super::{DocumentStore, PostFilter, PostSort, StoreError, StoreResult, UpdateOutcome};
use crate::domain::{Collection, Comment, Post, RelationField, RelationValue, User};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    posts: DashMap<Uuid, Post>,
    comments: DashMap<Uuid, Comment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }
}

fn user_add(user: &mut User, value: RelationValue) -> bool {
    match value {
        RelationValue::Follow(v) => user.following.insert(v),
        RelationValue::LikedPost(v) => user.liked_posts.insert(v),
        RelationValue::LikedComment(v) => user.liked_comments.insert(v),
        RelationValue::SavedPost(v) => user.saved_posts.insert(v),
        RelationValue::Like(_) => false,
    }
}

fn user_remove(user: &mut User, field: RelationField, key: Uuid) -> bool {
    match field {
        RelationField::Following => user.following.remove(key),
        RelationField::LikedPosts => user.liked_posts.remove(key),
        RelationField::LikedComments => user.liked_comments.remove(key),
        RelationField::SavedPosts => user.saved_posts.remove(key),
        RelationField::PostLikes | RelationField::CommentLikes => false,
    }
}

fn user_contains(user: &User, field: RelationField, key: Uuid) -> bool {
    match field {
        RelationField::Following => user.following.contains(key),
        RelationField::LikedPosts => user.liked_posts.contains(key),
        RelationField::LikedComments => user.liked_comments.contains(key),
        RelationField::SavedPosts => user.saved_posts.contains(key),
        RelationField::PostLikes | RelationField::CommentLikes => false,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        self.users.insert(user.id, user);
        Ok(())
    }

    async fn insert_post(&self, post: Post) -> StoreResult<()> {
        self.posts.insert(post.id, post);
        Ok(())
    }

    async fn insert_comment(&self, comment: Comment) -> StoreResult<()> {
        self.comments.insert(comment.id, comment);
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_users(&self, ids: Vec<Uuid>) -> StoreResult<Vec<User>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.clone()))
            .collect())
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        Ok(self.posts.get(&id).map(|p| p.clone()))
    }

    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        Ok(self.comments.get(&id).map(|c| c.clone()))
    }

    async fn set_add(
        &self,
        field: RelationField,
        owner_id: Uuid,
        value: RelationValue,
    ) -> StoreResult<UpdateOutcome> {
        if !value.fits(field) {
            return Err(StoreError::RelationMismatch(field));
        }

        let outcome = match field.collection() {
            Collection::Users => match self.users.get_mut(&owner_id) {
                Some(mut user) => {
                    let modified = user_add(&mut user, value);
                    if modified {
                        user.updated_at = Utc::now();
                    }
                    UpdateOutcome::matched(modified)
                }
                None => UpdateOutcome::unmatched(),
            },
            Collection::Posts => match (self.posts.get_mut(&owner_id), value) {
                (Some(mut post), RelationValue::Like(like)) => {
                    let modified = post.likes.insert(like);
                    if modified {
                        post.updated_at = Utc::now();
                    }
                    UpdateOutcome::matched(modified)
                }
                _ => UpdateOutcome::unmatched(),
            },
            Collection::Comments => match (self.comments.get_mut(&owner_id), value) {
                (Some(mut comment), RelationValue::Like(like)) => {
                    let modified = comment.likes.insert(like);
                    if modified {
                        comment.updated_at = Utc::now();
                    }
                    UpdateOutcome::matched(modified)
                }
                _ => UpdateOutcome::unmatched(),
            },
        };

        Ok(outcome)
    }

    async fn set_remove(
        &self,
        field: RelationField,
        owner_id: Uuid,
        key: Uuid,
    ) -> StoreResult<UpdateOutcome> {
        let outcome = match field.collection() {
            Collection::Users => match self.users.get_mut(&owner_id) {
                Some(mut user) => {
                    let modified = user_remove(&mut user, field, key);
                    if modified {
                        user.updated_at = Utc::now();
                    }
                    UpdateOutcome::matched(modified)
                }
                None => UpdateOutcome::unmatched(),
            },
            Collection::Posts => match self.posts.get_mut(&owner_id) {
                Some(mut post) => {
                    let modified = post.likes.remove(key);
                    if modified {
                        post.updated_at = Utc::now();
                    }
                    UpdateOutcome::matched(modified)
                }
                None => UpdateOutcome::unmatched(),
            },
            Collection::Comments => match self.comments.get_mut(&owner_id) {
                Some(mut comment) => {
                    let modified = comment.likes.remove(key);
                    if modified {
                        comment.updated_at = Utc::now();
                    }
                    UpdateOutcome::matched(modified)
                }
                None => UpdateOutcome::unmatched(),
            },
        };

        Ok(outcome)
    }

    async fn set_contains(
        &self,
        field: RelationField,
        owner_id: Uuid,
        key: Uuid,
    ) -> StoreResult<Option<bool>> {
        let found = match field.collection() {
            Collection::Users => self
                .users
                .get(&owner_id)
                .map(|u| user_contains(&u, field, key)),
            Collection::Posts => self.posts.get(&owner_id).map(|p| p.likes.contains(key)),
            Collection::Comments => self
                .comments
                .get(&owner_id)
                .map(|c| c.likes.contains(key)),
        };

        Ok(found)
    }

    async fn set_remove_everywhere(&self, field: RelationField, key: Uuid) -> StoreResult<u64> {
        let now = Utc::now();
        let mut changed = 0u64;

        match field.collection() {
            Collection::Users => {
                for mut user in self.users.iter_mut() {
                    if user_remove(&mut user, field, key) {
                        user.updated_at = now;
                        changed += 1;
                    }
                }
            }
            Collection::Posts => {
                for mut post in self.posts.iter_mut() {
                    if post.likes.remove(key) {
                        post.updated_at = now;
                        changed += 1;
                    }
                }
            }
            Collection::Comments => {
                for mut comment in self.comments.iter_mut() {
                    if comment.likes.remove(key) {
                        comment.updated_at = now;
                        changed += 1;
                    }
                }
            }
        }

        Ok(changed)
    }

    async fn sample_posts(&self, size: usize) -> StoreResult<Vec<Post>> {
        let all: Vec<Post> = self.posts.iter().map(|p| p.value().clone()).collect();
        let sample = {
            let mut rng = rand::thread_rng();
            all.choose_multiple(&mut rng, size).cloned().collect()
        };
        Ok(sample)
    }

    async fn find_posts(
        &self,
        filter: PostFilter,
        sort: PostSort,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| filter.matches(p.value()))
            .map(|p| p.value().clone())
            .collect();

        sort.apply(&mut posts);
        if let Some(limit) = limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    async fn find_comment_ids_by_post(&self, post_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(self
            .comments
            .iter()
            .filter(|c| c.post == post_id)
            .map(|c| c.id)
            .collect())
    }

    async fn delete_comments_by_post(&self, post_id: Uuid) -> StoreResult<u64> {
        let mut removed = 0u64;
        self.comments.retain(|_, c| {
            let keep = c.post != post_id;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.comments.remove(&id).is_some())
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.posts.remove(&id).is_some())
    }
}
