use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{RelationField, RelationValue};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::DocumentStore;

/// Idempotent set operations on embedded relation lists.
///
/// Works the same on the actor's lists (`users.*`) and on item lists
/// (`posts.likes`, `comments.likes`). Each call touches exactly one document.
#[derive(Clone)]
pub struct RelationStore {
    store: Arc<dyn DocumentStore>,
}

impl RelationStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Returns true if the list changed, false if the value was already present.
    pub async fn add_to_set(
        &self,
        owner_id: Uuid,
        field: RelationField,
        value: RelationValue,
    ) -> ServiceResult<bool> {
        let outcome = self.store.set_add(field, owner_id, value).await?;
        if !outcome.matched {
            return Err(ServiceError::not_found(field.collection().entity(), owner_id));
        }
        Ok(outcome.modified)
    }

    /// Returns true if the list changed, false if the key was absent.
    pub async fn remove_from_set(
        &self,
        owner_id: Uuid,
        field: RelationField,
        key: Uuid,
    ) -> ServiceResult<bool> {
        let outcome = self.store.set_remove(field, owner_id, key).await?;
        if !outcome.matched {
            return Err(ServiceError::not_found(field.collection().entity(), owner_id));
        }
        Ok(outcome.modified)
    }

    pub async fn contains(
        &self,
        owner_id: Uuid,
        field: RelationField,
        key: Uuid,
    ) -> ServiceResult<bool> {
        self.store
            .set_contains(field, owner_id, key)
            .await?
            .ok_or_else(|| ServiceError::not_found(field.collection().entity(), owner_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LikedPost, User};
    use crate::repository::MemoryStore;

    async fn setup() -> (RelationStore, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("Ada", "ada");
        let user_id = user.id;
        store.insert_user(user).await.unwrap();
        (RelationStore::new(store), user_id)
    }

    #[tokio::test]
    async fn add_then_remove_round_trip() {
        let (relations, user_id) = setup().await;
        let post_id = Uuid::new_v4();
        let value = RelationValue::LikedPost(LikedPost { post_id });

        assert!(relations
            .add_to_set(user_id, RelationField::LikedPosts, value.clone())
            .await
            .unwrap());
        assert!(!relations
            .add_to_set(user_id, RelationField::LikedPosts, value)
            .await
            .unwrap());
        assert!(relations
            .contains(user_id, RelationField::LikedPosts, post_id)
            .await
            .unwrap());

        assert!(relations
            .remove_from_set(user_id, RelationField::LikedPosts, post_id)
            .await
            .unwrap());
        assert!(!relations
            .remove_from_set(user_id, RelationField::LikedPosts, post_id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn missing_owner_is_not_found() {
        let (relations, _) = setup().await;
        let ghost = Uuid::new_v4();

        let err = relations
            .contains(ghost, RelationField::SavedPosts, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(msg) if msg.starts_with("User")));

        let err = relations
            .remove_from_set(ghost, RelationField::PostLikes, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(msg) if msg.starts_with("Post")));
    }
}
