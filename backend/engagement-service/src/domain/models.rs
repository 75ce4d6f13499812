use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::relation_set::{RelationEntry, RelationSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

// ============================================================================
// Embedded relation entries
// ============================================================================

/// Entry of `User::following`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowEdge {
    pub user_id: Uuid,
    pub followed_at: DateTime<Utc>,
}

impl RelationEntry for FollowEdge {
    fn key(&self) -> Uuid {
        self.user_id
    }
}

/// Entry of `User::liked_posts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikedPost {
    pub post_id: Uuid,
}

impl RelationEntry for LikedPost {
    fn key(&self) -> Uuid {
        self.post_id
    }
}

/// Entry of `User::liked_comments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikedComment {
    pub comment_id: Uuid,
}

impl RelationEntry for LikedComment {
    fn key(&self) -> Uuid {
        self.comment_id
    }
}

/// Entry of `User::saved_posts` (personal bookmark, no mirror on the post)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPost {
    pub post_id: Uuid,
    pub saved_at: DateTime<Utc>,
}

impl RelationEntry for SavedPost {
    fn key(&self) -> Uuid {
        self.post_id
    }
}

/// Entry of `Post::likes` and `Comment::likes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub user_id: Uuid,
}

impl RelationEntry for Like {
    fn key(&self) -> Uuid {
        self.user_id
    }
}

// ============================================================================
// Documents
// ============================================================================

/// User document with its embedded relation lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub handle: String,
    pub image: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub following: RelationSet<FollowEdge>,
    #[serde(default)]
    pub liked_posts: RelationSet<LikedPost>,
    #[serde(default)]
    pub liked_comments: RelationSet<LikedComment>,
    #[serde(default)]
    pub saved_posts: RelationSet<SavedPost>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, handle: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            handle: handle.into(),
            image: None,
            role: UserRole::User,
            password_hash: None,
            following: RelationSet::new(),
            liked_posts: RelationSet::new(),
            liked_comments: RelationSet::new(),
            saved_posts: RelationSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn followed_user_ids(&self) -> Vec<Uuid> {
        self.following.keys()
    }
}

/// Public view of a user: no credentials, no liked/saved lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub handle: String,
    pub image: Option<String>,
    pub role: UserRole,
    pub following: RelationSet<FollowEdge>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            handle: user.handle,
            image: user.image,
            role: user.role,
            following: user.following,
            created_at: user.created_at,
        }
    }
}

/// Fixed owner projection attached to every post returned by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub handle: String,
    pub image: Option<String>,
    pub role: UserRole,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            handle: user.handle.clone(),
            image: user.image.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub owner: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    #[serde(default)]
    pub likes: RelationSet<Like>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(owner: Uuid, title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            title: title.into(),
            description: description.into(),
            image: None,
            likes: RelationSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub owner: Uuid,
    pub post: Uuid,
    pub content: String,
    #[serde(default)]
    pub likes: RelationSet<Like>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(owner: Uuid, post: Uuid, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            post,
            content: content.into(),
            likes: RelationSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }
}

/// Post with its owner replaced by the owner projection.
///
/// `owner` is `None` when the owning user no longer exists; `owner_id` keeps
/// the raw reference either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWithOwner {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner: Option<OwnerSummary>,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub likes: RelationSet<Like>,
    pub like_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostWithOwner {
    pub fn new(post: Post, owner: Option<OwnerSummary>) -> Self {
        let like_count = post.like_count();
        Self {
            id: post.id,
            owner_id: post.owner,
            owner,
            title: post.title,
            description: post.description,
            image: post.image,
            likes: post.likes,
            like_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Saved-post listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPostView {
    pub saved_at: DateTime<Utc>,
    pub post: PostWithOwner,
}
