use actix_web::{web, HttpResponse};
use serde_json::json;

use super::AppState;
use crate::domain::parse_id;
use crate::error::ServiceResult;
use crate::middleware::ActorId;

pub async fn follow(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let target_id = parse_id("user", &path)?;
    let profile = state.engagement.follow(actor.0, target_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn unfollow(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let target_id = parse_id("user", &path)?;
    let profile = state.engagement.unfollow(actor.0, target_id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn check_follow(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let target_id = parse_id("user", &path)?;
    let following = state.engagement.check_follow(actor.0, target_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "following": following })))
}

pub async fn like_post(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let post_id = parse_id("post", &path)?;
    let post = state.engagement.like_post(actor.0, post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn unlike_post(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let post_id = parse_id("post", &path)?;
    let post = state.engagement.unlike_post(actor.0, post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn check_liked_post(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let post_id = parse_id("post", &path)?;
    let liked = state.engagement.check_liked_post(actor.0, post_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "liked": liked })))
}

pub async fn like_comment(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let comment_id = parse_id("comment", &path)?;
    let comment = state.engagement.like_comment(actor.0, comment_id).await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn unlike_comment(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let comment_id = parse_id("comment", &path)?;
    let comment = state.engagement.unlike_comment(actor.0, comment_id).await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn check_liked_comment(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let comment_id = parse_id("comment", &path)?;
    let liked = state
        .engagement
        .check_liked_comment(actor.0, comment_id)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "liked": liked })))
}

pub async fn save_post(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let post_id = parse_id("post", &path)?;
    let post = state.engagement.save_post(actor.0, post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn remove_saved_post(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let post_id = parse_id("post", &path)?;
    let post = state.engagement.remove_saved_post(actor.0, post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn check_saved_post(
    state: web::Data<AppState>,
    actor: ActorId,
    path: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let post_id = parse_id("post", &path)?;
    let saved = state.engagement.check_saved_post(actor.0, post_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "saved": saved })))
}

pub async fn list_saved_posts(
    state: web::Data<AppState>,
    actor: ActorId,
) -> ServiceResult<HttpResponse> {
    let saved = state.engagement.saved_posts(actor.0).await?;
    Ok(HttpResponse::Ok().json(saved))
}
