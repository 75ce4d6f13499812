use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::AppState;
use crate::domain::{FeedRequest, FeedTag};
use crate::error::{ServiceError, ServiceResult};
use crate::middleware::OptionalActor;

#[derive(Debug, Deserialize)]
pub struct FeedQueryParams {
    /// Comma separated: `random`, `following`, `myPosts`
    #[serde(default = "default_tags")]
    pub tags: String,
    /// Kept as text so a bad value renders as a validation error
    pub limit: Option<String>,
}

fn default_tags() -> String {
    "random".to_string()
}

impl FeedQueryParams {
    fn parse_limit(&self) -> ServiceResult<Option<usize>> {
        self.limit
            .as_deref()
            .map(|raw| {
                raw.trim().parse::<usize>().map_err(|_| {
                    ServiceError::Validation(format!("invalid limit '{}'", raw))
                })
            })
            .transpose()
    }
}

/// `random` works anonymously; `following` and `myPosts` need the caller.
pub async fn get_feed(
    state: web::Data<AppState>,
    actor: OptionalActor,
    query: web::Query<FeedQueryParams>,
) -> ServiceResult<HttpResponse> {
    let mut request = FeedRequest::new(FeedTag::parse_list(&query.tags)?);
    request.limit = query.parse_limit()?;
    request.actor = actor.0;

    let feed = state.feed.get_feed(request).await?;
    Ok(HttpResponse::Ok().json(feed))
}
