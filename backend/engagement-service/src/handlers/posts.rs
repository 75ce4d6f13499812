use actix_web::{web, HttpResponse};

use super::AppState;
use crate::domain::parse_id;
use crate::error::{ServiceError, ServiceResult};
use crate::middleware::ActorId;

/// Delete a post and every reference to it. Owner only.
pub async fn delete_post(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let post_id = parse_id("post", &path)?;

    let post = state
        .store
        .find_post(post_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Post", post_id))?;
    if post.owner != actor.0 {
        return Err(ServiceError::Forbidden(
            "only the owner can delete this post".to_string(),
        ));
    }

    let report = state.cascade.delete_post(post_id).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Delete a comment and unlink it from every user's liked comments. Owner only.
pub async fn delete_comment(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let comment_id = parse_id("comment", &path)?;

    let comment = state
        .store
        .find_comment(comment_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Comment", comment_id))?;
    if comment.owner != actor.0 {
        return Err(ServiceError::Forbidden(
            "only the owner can delete this comment".to_string(),
        ));
    }

    let report = state.cascade.delete_comment(comment_id).await?;
    Ok(HttpResponse::Ok().json(report))
}
