/// HTTP handlers for engagement-service
///
/// - Me: follow, like, save toggles and checks for the calling user
/// - Feed: multi-tag home feed
/// - Posts/comments: owner-only cascade deletion
/// - Health: liveness and store readiness
pub mod engagement;
pub mod feed;
pub mod health;
pub mod posts;

use actix_web::web;
use std::sync::Arc;

use crate::config::FeedConfig;
use crate::metrics::serve_metrics;
use crate::repository::DocumentStore;
use crate::services::{CascadeDeleter, EngagementService, FeedAggregator};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub engagement: EngagementService,
    pub feed: FeedAggregator,
    pub cascade: CascadeDeleter,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, feed_config: FeedConfig) -> Self {
        Self {
            engagement: EngagementService::new(store.clone()),
            feed: FeedAggregator::new(store.clone(), feed_config),
            cascade: CascadeDeleter::new(store.clone()),
            store,
        }
    }
}

/// Register every route. The caller provides `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(serve_metrics)).service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health::health_summary))
            .route("/health/ready", web::get().to(health::readiness))
            .route("/health/live", web::get().to(health::liveness))
            .service(
                web::resource("/me/following/{user_id}")
                    .route(web::get().to(engagement::check_follow))
                    .route(web::post().to(engagement::follow))
                    .route(web::delete().to(engagement::unfollow)),
            )
            .service(
                web::resource("/me/liked-posts/{post_id}")
                    .route(web::get().to(engagement::check_liked_post))
                    .route(web::post().to(engagement::like_post))
                    .route(web::delete().to(engagement::unlike_post)),
            )
            .service(
                web::resource("/me/liked-comments/{comment_id}")
                    .route(web::get().to(engagement::check_liked_comment))
                    .route(web::post().to(engagement::like_comment))
                    .route(web::delete().to(engagement::unlike_comment)),
            )
            .route("/me/saved-posts", web::get().to(engagement::list_saved_posts))
            .service(
                web::resource("/me/saved-posts/{post_id}")
                    .route(web::get().to(engagement::check_saved_post))
                    .route(web::post().to(engagement::save_post))
                    .route(web::delete().to(engagement::remove_saved_post)),
            )
            .route("/feed", web::get().to(feed::get_feed))
            .route("/posts/{post_id}", web::delete().to(posts::delete_post))
            .route(
                "/comments/{comment_id}",
                web::delete().to(posts::delete_comment),
            ),
    );
}
