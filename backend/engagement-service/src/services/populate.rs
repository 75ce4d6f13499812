use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::domain::{OwnerSummary, Post, PostWithOwner};
use crate::error::ServiceResult;
use crate::repository::DocumentStore;

/// Replace each post's owner reference with the fixed owner projection.
///
/// Owners are fetched in one batch; order of `posts` is preserved. A post whose
/// owner no longer exists keeps `owner: None`.
pub async fn populate_owners(
    store: &dyn DocumentStore,
    posts: Vec<Post>,
) -> ServiceResult<Vec<PostWithOwner>> {
    if posts.is_empty() {
        return Ok(vec![]);
    }

    let owner_ids: Vec<Uuid> = posts
        .iter()
        .map(|p| p.owner)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let owners: HashMap<Uuid, OwnerSummary> = store
        .find_users(owner_ids)
        .await?
        .iter()
        .map(|u| (u.id, OwnerSummary::from(u)))
        .collect();

    Ok(posts
        .into_iter()
        .map(|post| {
            let owner = owners.get(&post.owner).cloned();
            PostWithOwner::new(post, owner)
        })
        .collect())
}

pub async fn populate_owner(store: &dyn DocumentStore, post: Post) -> ServiceResult<PostWithOwner> {
    let owner = store.find_user(post.owner).await?.map(|u| OwnerSummary::from(&u));
    Ok(PostWithOwner::new(post, owner))
}
