//! Integration tests: PostgreSQL document store.
//!
//! Requires a reachable database:
//!   TEST_DATABASE_URL=postgres://... cargo test -p engagement-service -- --ignored

use engagement_service::config::DatabaseConfig;
use engagement_service::domain::{
    Comment, FollowEdge, Like, LikedComment, LikedPost, Post, RelationField, RelationValue,
    SavedPost, User,
};
use engagement_service::repository::{DocumentStore, PgDocumentStore, PostFilter, PostSort};
use engagement_service::services::{CascadeDeleter, EngagementService};
use serial_test::serial;
use std::sync::Arc;
use uuid::Uuid;

async fn store() -> Arc<PgDocumentStore> {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let store = PgDocumentStore::connect(&DatabaseConfig {
        url,
        max_connections: 8,
        min_connections: 1,
        acquire_timeout_secs: 5,
    })
    .await
    .expect("connect");
    store.migrate().await.expect("migrate");

    sqlx::query("TRUNCATE users, posts, comments")
        .execute(store.pool())
        .await
        .expect("truncate");

    Arc::new(store)
}

async fn user(store: &PgDocumentStore, handle: &str) -> Uuid {
    let user = User::new(handle.to_uppercase(), handle);
    let id = user.id;
    store.insert_user(user).await.expect("insert user");
    id
}

#[tokio::test]
#[ignore]
#[serial]
async fn set_add_is_idempotent_and_reports_outcome() {
    let store = store().await;
    let alice = user(&store, "alice").await;
    let post_id = Uuid::new_v4();
    let value = RelationValue::LikedPost(LikedPost { post_id });

    let first = store
        .set_add(RelationField::LikedPosts, alice, value.clone())
        .await
        .unwrap();
    let second = store
        .set_add(RelationField::LikedPosts, alice, value)
        .await
        .unwrap();
    let missing = store
        .set_add(
            RelationField::LikedPosts,
            Uuid::new_v4(),
            RelationValue::LikedPost(LikedPost { post_id }),
        )
        .await
        .unwrap();

    assert!(first.matched && first.modified);
    assert!(second.matched && !second.modified);
    assert!(!missing.matched);

    let alice_doc = store.find_user(alice).await.unwrap().unwrap();
    assert_eq!(alice_doc.liked_posts.len(), 1);
}

#[tokio::test]
#[ignore]
#[serial]
async fn set_add_matches_on_key_only() {
    let store = store().await;
    let alice = user(&store, "alice").await;
    let bob = Uuid::new_v4();

    let edge = |at| {
        RelationValue::Follow(FollowEdge {
            user_id: bob,
            followed_at: at,
        })
    };
    store
        .set_add(RelationField::Following, alice, edge(chrono::Utc::now()))
        .await
        .unwrap();
    let again = store
        .set_add(
            RelationField::Following,
            alice,
            edge(chrono::Utc::now() + chrono::Duration::seconds(30)),
        )
        .await
        .unwrap();

    assert!(!again.modified);
    assert_eq!(
        store
            .set_contains(RelationField::Following, alice, bob)
            .await
            .unwrap(),
        Some(true)
    );
}

#[tokio::test]
#[ignore]
#[serial]
async fn concurrent_adds_keep_a_single_entry() {
    let store = store().await;
    let alice = user(&store, "alice").await;
    let post = Post::new(alice, "hot", "");
    let post_id = post.id;
    store.insert_post(post).await.unwrap();

    let adds = (0..16).map(|_| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .set_add(
                    RelationField::PostLikes,
                    post_id,
                    RelationValue::Like(Like { user_id: alice }),
                )
                .await
        })
    });
    for handle in adds.collect::<Vec<_>>() {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(
        store.find_post(post_id).await.unwrap().unwrap().like_count(),
        1
    );
}

#[tokio::test]
#[ignore]
#[serial]
async fn remove_everywhere_and_cascade() {
    let store = store().await;
    let alice = user(&store, "alice").await;
    let bob = user(&store, "bob").await;
    let post = Post::new(bob, "doomed", "");
    let post_id = post.id;
    store.insert_post(post).await.unwrap();
    let comment = Comment::new(alice, post_id, "first");
    let comment_id = comment.id;
    store.insert_comment(comment).await.unwrap();

    for actor in [alice, bob] {
        store
            .set_add(
                RelationField::SavedPosts,
                actor,
                RelationValue::SavedPost(SavedPost {
                    post_id,
                    saved_at: chrono::Utc::now(),
                }),
            )
            .await
            .unwrap();
    }
    store
        .set_add(
            RelationField::LikedComments,
            bob,
            RelationValue::LikedComment(LikedComment { comment_id }),
        )
        .await
        .unwrap();

    let report = CascadeDeleter::new(store.clone())
        .delete_post(post_id)
        .await
        .unwrap();

    assert_eq!(report.saved_refs_removed, 2);
    assert_eq!(report.comment_like_refs_removed, 1);
    assert_eq!(report.comments_deleted, 1);
    assert!(report.deleted);
    assert!(store.find_comment(comment_id).await.unwrap().is_none());
    assert!(store
        .find_user(bob)
        .await
        .unwrap()
        .unwrap()
        .liked_comments
        .is_empty());
}

#[tokio::test]
#[ignore]
#[serial]
async fn find_posts_orders_and_limits() {
    let store = store().await;
    let alice = user(&store, "alice").await;
    let now = chrono::Utc::now();
    let mut ids = Vec::new();
    for i in 0..5 {
        let post = Post::new(alice, format!("p{}", i), "")
            .with_created_at(now - chrono::Duration::minutes(10 - i));
        ids.push(post.id);
        store.insert_post(post).await.unwrap();
    }

    let newest = store
        .find_posts(PostFilter::Owner(alice), PostSort::NewestFirst, Some(2))
        .await
        .unwrap();
    assert_eq!(
        newest.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![ids[4], ids[3]]
    );

    let all = store
        .find_posts(PostFilter::OwnerIn(vec![alice]), PostSort::NewestFirst, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 5);

    let sample = store.sample_posts(3).await.unwrap();
    assert_eq!(sample.len(), 3);
}

#[tokio::test]
#[ignore]
#[serial]
async fn engagement_service_over_postgres() {
    let store = store().await;
    let alice = user(&store, "alice").await;
    let bob = user(&store, "bob").await;
    let post = Post::new(bob, "hello", "");
    let post_id = post.id;
    store.insert_post(post).await.unwrap();
    let service = EngagementService::new(store.clone());

    service.like_post(alice, post_id).await.unwrap();
    let post = service.like_post(alice, post_id).await.unwrap();
    assert_eq!(post.like_count(), 1);

    let saved = service.save_post(alice, post_id).await.unwrap();
    assert_eq!(saved.owner.unwrap().handle, "bob");
    assert_eq!(service.saved_posts(alice).await.unwrap().len(), 1);

    let post = service.unlike_post(alice, post_id).await.unwrap();
    assert_eq!(post.like_count(), 0);
}
