//! Follow / like / save toggles.
//!
//! Likes are kept on both sides: the item's `likes` and the actor's
//! `liked_posts` / `liked_comments`. The two writes are separate
//! single-document operations, actor side first. If the item side fails after
//! the actor side succeeded the pair stays diverged until the next toggle; the
//! failure is logged, counted and returned.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::{
    Comment, FollowEdge, Like, LikedComment, LikedPost, Post, PostWithOwner, RelationField,
    RelationValue, SavedPost, SavedPostView, User, UserProfile,
};
use crate::error::{ServiceError, ServiceResult};
use crate::metrics::{ENGAGEMENT_TOGGLE_TOTAL, MIRROR_WRITE_FAILURES};
use crate::repository::{DocumentStore, PostFilter, PostSort};
use crate::services::populate::{populate_owner, populate_owners};
use crate::services::relation_store::RelationStore;

const FOLLOW: &str = "follow";
const POST_LIKE: &str = "post_like";
const COMMENT_LIKE: &str = "comment_like";
const SAVE: &str = "save";

#[derive(Debug, Clone, Copy)]
enum Action {
    Add,
    Remove,
}

impl Action {
    fn as_str(&self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Remove => "remove",
        }
    }
}

fn record_toggle(
    relation: &'static str,
    action: Action,
    changed: bool,
    actor_id: Uuid,
    item_id: Uuid,
) {
    let outcome = if changed { "applied" } else { "noop" };
    ENGAGEMENT_TOGGLE_TOTAL
        .with_label_values(&[relation, action.as_str(), outcome])
        .inc();
    if !changed {
        debug!(%actor_id, %item_id, relation, action = action.as_str(), "toggle was a no-op");
    }
}

#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn DocumentStore>,
    relations: RelationStore,
}

impl EngagementService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let relations = RelationStore::new(store.clone());
        Self { store, relations }
    }

    async fn require_user(&self, id: Uuid) -> ServiceResult<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    async fn require_post(&self, id: Uuid) -> ServiceResult<Post> {
        self.store
            .find_post(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Post", id))
    }

    async fn require_comment(&self, id: Uuid) -> ServiceResult<Comment> {
        self.store
            .find_comment(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comment", id))
    }

    /// Apply the item side of a mirrored toggle after the actor side went through.
    async fn mirror_item_side(
        &self,
        relation: &'static str,
        action: Action,
        actor_id: Uuid,
        item_id: Uuid,
        field: RelationField,
    ) -> ServiceResult<bool> {
        let result = match action {
            Action::Add => {
                let like = RelationValue::Like(Like { user_id: actor_id });
                self.relations.add_to_set(item_id, field, like).await
            }
            Action::Remove => self.relations.remove_from_set(item_id, field, actor_id).await,
        };

        result.map_err(|err| {
            error!(
                %actor_id,
                %item_id,
                relation,
                action = action.as_str(),
                error = %err,
                "mirror write failed after actor side was applied"
            );
            MIRROR_WRITE_FAILURES.with_label_values(&[relation]).inc();
            err
        })
    }

    // ---- follow ----

    /// Returns the followed user's public profile.
    pub async fn follow(&self, actor_id: Uuid, target_id: Uuid) -> ServiceResult<UserProfile> {
        self.require_user(target_id).await?;

        let edge = RelationValue::Follow(FollowEdge {
            user_id: target_id,
            followed_at: Utc::now(),
        });
        let changed = self
            .relations
            .add_to_set(actor_id, RelationField::Following, edge)
            .await?;
        record_toggle(FOLLOW, Action::Add, changed, actor_id, target_id);

        Ok(self.require_user(target_id).await?.into())
    }

    pub async fn unfollow(&self, actor_id: Uuid, target_id: Uuid) -> ServiceResult<UserProfile> {
        let target = self.require_user(target_id).await?;

        let changed = self
            .relations
            .remove_from_set(actor_id, RelationField::Following, target_id)
            .await?;
        record_toggle(FOLLOW, Action::Remove, changed, actor_id, target_id);

        Ok(target.into())
    }

    pub async fn check_follow(&self, actor_id: Uuid, target_id: Uuid) -> ServiceResult<bool> {
        self.relations
            .contains(actor_id, RelationField::Following, target_id)
            .await
    }

    // ---- post likes ----

    pub async fn like_post(&self, actor_id: Uuid, post_id: Uuid) -> ServiceResult<Post> {
        self.require_post(post_id).await?;

        let liked = RelationValue::LikedPost(LikedPost { post_id });
        let changed = self
            .relations
            .add_to_set(actor_id, RelationField::LikedPosts, liked)
            .await?;
        let mirrored = self
            .mirror_item_side(POST_LIKE, Action::Add, actor_id, post_id, RelationField::PostLikes)
            .await?;
        record_toggle(POST_LIKE, Action::Add, changed || mirrored, actor_id, post_id);

        self.require_post(post_id).await
    }

    pub async fn unlike_post(&self, actor_id: Uuid, post_id: Uuid) -> ServiceResult<Post> {
        self.require_post(post_id).await?;

        let changed = self
            .relations
            .remove_from_set(actor_id, RelationField::LikedPosts, post_id)
            .await?;
        let mirrored = self
            .mirror_item_side(POST_LIKE, Action::Remove, actor_id, post_id, RelationField::PostLikes)
            .await?;
        record_toggle(POST_LIKE, Action::Remove, changed || mirrored, actor_id, post_id);

        self.require_post(post_id).await
    }

    pub async fn check_liked_post(&self, actor_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        self.relations
            .contains(actor_id, RelationField::LikedPosts, post_id)
            .await
    }

    // ---- comment likes ----

    pub async fn like_comment(&self, actor_id: Uuid, comment_id: Uuid) -> ServiceResult<Comment> {
        self.require_comment(comment_id).await?;

        let liked = RelationValue::LikedComment(LikedComment { comment_id });
        let changed = self
            .relations
            .add_to_set(actor_id, RelationField::LikedComments, liked)
            .await?;
        let mirrored = self
            .mirror_item_side(
                COMMENT_LIKE,
                Action::Add,
                actor_id,
                comment_id,
                RelationField::CommentLikes,
            )
            .await?;
        record_toggle(COMMENT_LIKE, Action::Add, changed || mirrored, actor_id, comment_id);

        self.require_comment(comment_id).await
    }

    pub async fn unlike_comment(&self, actor_id: Uuid, comment_id: Uuid) -> ServiceResult<Comment> {
        self.require_comment(comment_id).await?;

        let changed = self
            .relations
            .remove_from_set(actor_id, RelationField::LikedComments, comment_id)
            .await?;
        let mirrored = self
            .mirror_item_side(
                COMMENT_LIKE,
                Action::Remove,
                actor_id,
                comment_id,
                RelationField::CommentLikes,
            )
            .await?;
        record_toggle(COMMENT_LIKE, Action::Remove, changed || mirrored, actor_id, comment_id);

        self.require_comment(comment_id).await
    }

    pub async fn check_liked_comment(&self, actor_id: Uuid, comment_id: Uuid) -> ServiceResult<bool> {
        self.relations
            .contains(actor_id, RelationField::LikedComments, comment_id)
            .await
    }

    // ---- saved posts ----

    /// Saving is one-sided: posts keep no list of savers.
    pub async fn save_post(&self, actor_id: Uuid, post_id: Uuid) -> ServiceResult<PostWithOwner> {
        let post = self.require_post(post_id).await?;

        let saved = RelationValue::SavedPost(SavedPost {
            post_id,
            saved_at: Utc::now(),
        });
        let changed = self
            .relations
            .add_to_set(actor_id, RelationField::SavedPosts, saved)
            .await?;
        record_toggle(SAVE, Action::Add, changed, actor_id, post_id);

        populate_owner(self.store.as_ref(), post).await
    }

    pub async fn remove_saved_post(
        &self,
        actor_id: Uuid,
        post_id: Uuid,
    ) -> ServiceResult<PostWithOwner> {
        let post = self.require_post(post_id).await?;

        let changed = self
            .relations
            .remove_from_set(actor_id, RelationField::SavedPosts, post_id)
            .await?;
        record_toggle(SAVE, Action::Remove, changed, actor_id, post_id);

        populate_owner(self.store.as_ref(), post).await
    }

    pub async fn check_saved_post(&self, actor_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        self.relations
            .contains(actor_id, RelationField::SavedPosts, post_id)
            .await
    }

    /// Most recently saved first. Saved ids whose post is gone are skipped.
    pub async fn saved_posts(&self, actor_id: Uuid) -> ServiceResult<Vec<SavedPostView>> {
        let actor = self.require_user(actor_id).await?;
        if actor.saved_posts.is_empty() {
            return Ok(vec![]);
        }

        let mut saved: Vec<SavedPost> = actor.saved_posts.into();
        saved.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));

        let ids = saved.iter().map(|s| s.post_id).collect();
        let mut found: HashMap<Uuid, Post> = self
            .store
            .find_posts(PostFilter::IdIn(ids), PostSort::NewestFirst, None)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let (posts, saved_at): (Vec<Post>, Vec<_>) = saved
            .iter()
            .filter_map(|s| found.remove(&s.post_id).map(|p| (p, s.saved_at)))
            .unzip();

        let posts = populate_owners(self.store.as_ref(), posts).await?;
        Ok(posts
            .into_iter()
            .zip(saved_at)
            .map(|(post, saved_at)| SavedPostView { saved_at, post })
            .collect())
    }
}
