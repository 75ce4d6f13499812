//! PostgreSQL document store.
//!
//! Relation lists are JSONB arrays on the owning row. Set operations are single
//! conditional `UPDATE`s guarded by a containment predicate: a concurrent
//! identical add blocks on the row lock, re-evaluates the predicate against
//! the committed row and turns into a no-op.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::{DocumentStore, PostFilter, PostSort, StoreError, StoreResult, UpdateOutcome};
use crate::config::DatabaseConfig;
use crate::domain::{
    Comment, FollowEdge, Like, LikedComment, LikedPost, Post, RelationField, RelationSet,
    RelationValue, SavedPost, User, UserRole,
};

const USER_COLUMNS: &str = "id, name, handle, image, role, password_hash, following, \
     liked_posts, liked_comments, saved_posts, created_at, updated_at";
const POST_COLUMNS: &str = "id, owner, title, description, image, likes, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, owner, post, content, likes, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    handle: String,
    image: Option<String>,
    role: String,
    password_hash: Option<String>,
    following: Json<RelationSet<FollowEdge>>,
    liked_posts: Json<RelationSet<LikedPost>>,
    liked_comments: Json<RelationSet<LikedComment>>,
    saved_posts: Json<RelationSet<SavedPost>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            handle: row.handle,
            image: row.image,
            role: UserRole::parse(&row.role),
            password_hash: row.password_hash,
            following: row.following.0,
            liked_posts: row.liked_posts.0,
            liked_comments: row.liked_comments.0,
            saved_posts: row.saved_posts.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    owner: Uuid,
    title: String,
    description: String,
    image: Option<String>,
    likes: Json<RelationSet<Like>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            owner: row.owner,
            title: row.title,
            description: row.description,
            image: row.image,
            likes: row.likes.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    owner: Uuid,
    post: Uuid,
    content: String,
    likes: Json<RelationSet<Like>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            owner: row.owner,
            post: row.post,
            content: row.content,
            likes: row.likes.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `(table, column)` for a relation list. Both come from fixed enums, never
/// from request input, so interpolating them into SQL is safe.
fn location(field: RelationField) -> (&'static str, &'static str) {
    (field.collection().name(), field.field_name())
}

fn order_clause(sort: PostSort) -> &'static str {
    match sort {
        PostSort::NewestFirst => "created_at DESC, id DESC",
    }
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the connection pool described by `config`
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "PostgreSQL pool created"
        );
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, handle, image, role, password_hash, following,
                               liked_posts, liked_comments, saved_posts, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                handle = EXCLUDED.handle,
                image = EXCLUDED.image,
                role = EXCLUDED.role,
                password_hash = EXCLUDED.password_hash,
                following = EXCLUDED.following,
                liked_posts = EXCLUDED.liked_posts,
                liked_comments = EXCLUDED.liked_comments,
                saved_posts = EXCLUDED.saved_posts,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.handle)
        .bind(&user.image)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(Json(&user.following))
        .bind(Json(&user.liked_posts))
        .bind(Json(&user.liked_comments))
        .bind(Json(&user.saved_posts))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_post(&self, post: Post) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, owner, title, description, image, likes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
            SET title = EXCLUDED.title,
                description = EXCLUDED.description,
                image = EXCLUDED.image,
                likes = EXCLUDED.likes,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(post.id)
        .bind(post.owner)
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.image)
        .bind(Json(&post.likes))
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_comment(&self, comment: Comment) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, owner, post, content, likes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET content = EXCLUDED.content,
                likes = EXCLUDED.likes,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(comment.id)
        .bind(comment.owner)
        .bind(comment.post)
        .bind(&comment.content)
        .bind(Json(&comment.likes))
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    async fn find_users(&self, ids: Vec<Uuid>) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Post::from))
    }

    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Comment::from))
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

        let (table, column) = location(field);
        let probe = field.probe(value.key());
        let entry: Value = value.to_json()?;

        let sql = format!(
            r#"
            WITH target AS (
                SELECT id FROM {table} WHERE id = $1
            ),
            updated AS (
                UPDATE {table}
                SET {column} = {column} || jsonb_build_array($2::jsonb),
                    updated_at = NOW()
                WHERE id = $1
                  AND NOT ({column} @> jsonb_build_array($3::jsonb))
                RETURNING id
            )
            SELECT EXISTS(SELECT 1 FROM target), EXISTS(SELECT 1 FROM updated)
            "#
        );

        let (matched, modified) = sqlx::query_as::<_, (bool, bool)>(&sql)
            .bind(owner_id)
            .bind(Json(entry))
            .bind(Json(probe))
            .fetch_one(&self.pool)
            .await?;

        debug!(%field, %owner_id, matched, modified, "set_add");
        Ok(UpdateOutcome { matched, modified })
    }

    async fn set_remove(
        &self,
        field: RelationField,
        owner_id: Uuid,
        key: Uuid,
    ) -> StoreResult<UpdateOutcome> {
        let (table, column) = location(field);
        let probe = field.probe(key);

        let sql = format!(
            r#"
            WITH target AS (
                SELECT id FROM {table} WHERE id = $1
            ),
            updated AS (
                UPDATE {table}
                SET {column} = COALESCE(
                        (SELECT jsonb_agg(elem ORDER BY pos)
                         FROM jsonb_array_elements({column}) WITH ORDINALITY AS t(elem, pos)
                         WHERE NOT (elem @> $2::jsonb)),
                        '[]'::jsonb),
                    updated_at = NOW()
                WHERE id = $1
                  AND {column} @> jsonb_build_array($2::jsonb)
                RETURNING id
            )
            SELECT EXISTS(SELECT 1 FROM target), EXISTS(SELECT 1 FROM updated)
            "#
        );

        let (matched, modified) = sqlx::query_as::<_, (bool, bool)>(&sql)
            .bind(owner_id)
            .bind(Json(probe))
            .fetch_one(&self.pool)
            .await?;

        debug!(%field, %owner_id, matched, modified, "set_remove");
        Ok(UpdateOutcome { matched, modified })
    }

    async fn set_contains(
        &self,
        field: RelationField,
        owner_id: Uuid,
        key: Uuid,
    ) -> StoreResult<Option<bool>> {
        let (table, column) = location(field);
        let sql = format!(
            "SELECT {column} @> jsonb_build_array($2::jsonb) FROM {table} WHERE id = $1"
        );

        let found = sqlx::query_scalar::<_, bool>(&sql)
            .bind(owner_id)
            .bind(Json(field.probe(key)))
            .fetch_optional(&self.pool)
            .await?;

        Ok(found)
    }

    async fn set_remove_everywhere(&self, field: RelationField, key: Uuid) -> StoreResult<u64> {
        let (table, column) = location(field);
        let sql = format!(
            r#"
            UPDATE {table}
            SET {column} = COALESCE(
                    (SELECT jsonb_agg(elem ORDER BY pos)
                     FROM jsonb_array_elements({column}) WITH ORDINALITY AS t(elem, pos)
                     WHERE NOT (elem @> $1::jsonb)),
                    '[]'::jsonb),
                updated_at = NOW()
            WHERE {column} @> jsonb_build_array($1::jsonb)
            "#
        );

        let result = sqlx::query(&sql)
            .bind(Json(field.probe(key)))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn sample_posts(&self, size: usize) -> StoreResult<Vec<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY random() LIMIT $1");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(size as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn find_posts(
        &self,
        filter: PostFilter,
        sort: PostSort,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Post>> {
        let order = order_clause(sort);
        // LIMIT NULL means no limit in PostgreSQL
        let limit = limit.map(|l| l as i64);

        let rows = match filter {
            PostFilter::Owner(owner) => {
                let sql = format!(
                    "SELECT {POST_COLUMNS} FROM posts WHERE owner = $1 ORDER BY {order} LIMIT $2"
                );
                sqlx::query_as::<_, PostRow>(&sql)
                    .bind(owner)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            PostFilter::OwnerIn(owners) => {
                if owners.is_empty() {
                    return Ok(vec![]);
                }
                let sql = format!(
                    "SELECT {POST_COLUMNS} FROM posts WHERE owner = ANY($1) ORDER BY {order} LIMIT $2"
                );
                sqlx::query_as::<_, PostRow>(&sql)
                    .bind(&owners)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            PostFilter::IdIn(ids) => {
                if ids.is_empty() {
                    return Ok(vec![]);
                }
                let sql = format!(
                    "SELECT {POST_COLUMNS} FROM posts WHERE id = ANY($1) ORDER BY {order} LIMIT $2"
                );
                sqlx::query_as::<_, PostRow>(&sql)
                    .bind(&ids)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn find_comment_ids_by_post(&self, post_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM comments
            WHERE post = $1
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn delete_comments_by_post(&self, post_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM comments
            WHERE post = $1
            "#,
        )
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
