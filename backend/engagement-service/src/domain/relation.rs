//! Addressing of embedded relation lists across the three collections.

use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use super::models::{FollowEdge, Like, LikedComment, LikedPost, SavedPost};
use super::relation_set::RelationEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Posts,
    Comments,
}

impl Collection {
    /// Table / collection name
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Posts => "posts",
            Collection::Comments => "comments",
        }
    }

    /// Singular entity label used in error messages
    pub fn entity(&self) -> &'static str {
        match self {
            Collection::Users => "User",
            Collection::Posts => "Post",
            Collection::Comments => "Comment",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An embedded relation list on a specific collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationField {
    /// `users.following`
    Following,
    /// `users.liked_posts`
    LikedPosts,
    /// `users.liked_comments`
    LikedComments,
    /// `users.saved_posts`
    SavedPosts,
    /// `posts.likes`
    PostLikes,
    /// `comments.likes`
    CommentLikes,
}

impl RelationField {
    pub fn collection(&self) -> Collection {
        match self {
            RelationField::Following
            | RelationField::LikedPosts
            | RelationField::LikedComments
            | RelationField::SavedPosts => Collection::Users,
            RelationField::PostLikes => Collection::Posts,
            RelationField::CommentLikes => Collection::Comments,
        }
    }

    /// Field (column) name inside the owning document
    pub fn field_name(&self) -> &'static str {
        match self {
            RelationField::Following => "following",
            RelationField::LikedPosts => "liked_posts",
            RelationField::LikedComments => "liked_comments",
            RelationField::SavedPosts => "saved_posts",
            RelationField::PostLikes | RelationField::CommentLikes => "likes",
        }
    }

    /// Name of the id attribute that identifies an entry of this list
    pub fn key_name(&self) -> &'static str {
        match self {
            RelationField::Following => "user_id",
            RelationField::LikedPosts | RelationField::SavedPosts => "post_id",
            RelationField::LikedComments => "comment_id",
            RelationField::PostLikes | RelationField::CommentLikes => "user_id",
        }
    }

    /// JSON object matching any entry keyed by `key`
    pub fn probe(&self, key: Uuid) -> Value {
        let mut probe = serde_json::Map::new();
        probe.insert(self.key_name().to_string(), Value::String(key.to_string()));
        Value::Object(probe)
    }
}

impl fmt::Display for RelationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.collection(), self.field_name())
    }
}

/// A value to be added to a relation list.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationValue {
    Follow(FollowEdge),
    LikedPost(LikedPost),
    LikedComment(LikedComment),
    SavedPost(SavedPost),
    Like(Like),
}

impl RelationValue {
    pub fn key(&self) -> Uuid {
        match self {
            RelationValue::Follow(v) => v.key(),
            RelationValue::LikedPost(v) => v.key(),
            RelationValue::LikedComment(v) => v.key(),
            RelationValue::SavedPost(v) => v.key(),
            RelationValue::Like(v) => v.key(),
        }
    }

    /// Whether this value belongs in `field`
    pub fn fits(&self, field: RelationField) -> bool {
        matches!(
            (self, field),
            (RelationValue::Follow(_), RelationField::Following)
                | (RelationValue::LikedPost(_), RelationField::LikedPosts)
                | (RelationValue::LikedComment(_), RelationField::LikedComments)
                | (RelationValue::SavedPost(_), RelationField::SavedPosts)
                | (RelationValue::Like(_), RelationField::PostLikes)
                | (RelationValue::Like(_), RelationField::CommentLikes)
        )
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            RelationValue::Follow(v) => serde_json::to_value(v),
            RelationValue::LikedPost(v) => serde_json::to_value(v),
            RelationValue::LikedComment(v) => serde_json::to_value(v),
            RelationValue::SavedPost(v) => serde_json::to_value(v),
            RelationValue::Like(v) => serde_json::to_value(v),
        }
    }
}
