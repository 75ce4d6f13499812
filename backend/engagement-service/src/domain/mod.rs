pub mod feed;
pub mod models;
pub mod relation;
pub mod relation_set;

use uuid::Uuid;

use crate::error::ServiceError;

pub use feed::{Feed, FeedRequest, FeedTag};
pub use models::{
    Comment, FollowEdge, Like, LikedComment, LikedPost, OwnerSummary, Post, PostWithOwner,
    SavedPost, SavedPostView, User, UserProfile, UserRole,
};
pub use relation::{Collection, RelationField, RelationValue};
pub use relation_set::{RelationEntry, RelationSet};

/// Parse an identifier coming from the outside; `kind` names it in the error.
pub fn parse_id(kind: &str, raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ServiceError::Validation(format!("malformed {} id '{}'", kind, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_garbage() {
        let err = parse_id("post", "not-a-uuid").unwrap_err();
        assert!(matches!(err, ServiceError::Validation(msg) if msg.contains("post")));
    }

    #[test]
    fn parse_id_accepts_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id("user", &id.to_string()).unwrap(), id);
    }
}
