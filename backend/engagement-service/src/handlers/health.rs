use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;

use super::AppState;

#[derive(Serialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    message: String,
    latency_ms: u64,
    timestamp: String,
}

pub async fn health_summary(state: web::Data<AppState>) -> HttpResponse {
    match state.store.health_check().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "engagement-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("store check failed: {}", e),
            "service": "engagement-service"
        })),
    }
}

pub async fn readiness(state: web::Data<AppState>) -> HttpResponse {
    let start = Instant::now();
    let result = state.store.health_check().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (ready, status, message) = match result {
        Ok(()) => (true, ComponentStatus::Healthy, "store reachable".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (false, ComponentStatus::Unhealthy, e.to_string())
        }
    };

    let response = ReadinessResponse {
        ready,
        status,
        message,
        latency_ms,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
