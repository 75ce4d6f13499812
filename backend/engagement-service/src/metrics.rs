//! Prometheus metrics for engagement-service.
//!
//! Exposes relation/feed/cascade collectors and an HTTP handler for the
//! `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Relation toggles by relation kind, action (add/remove) and outcome (applied/noop).
    pub static ref ENGAGEMENT_TOGGLE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "engagement_toggle_total",
        "Relation toggles segmented by relation, action and outcome",
        &["relation", "action", "outcome"]
    )
    .expect("failed to register engagement_toggle_total");

    /// Second half of a mirror write failed after the first half succeeded.
    pub static ref MIRROR_WRITE_FAILURES: IntCounterVec = register_int_counter_vec!(
        "engagement_mirror_write_failures_total",
        "Mirror writes that left the two sides of a relation diverged",
        &["relation"]
    )
    .expect("failed to register engagement_mirror_write_failures_total");

    pub static ref FEED_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_request_total",
        "Feed tag computations segmented by tag",
        &["tag"]
    )
    .expect("failed to register feed_request_total");

    pub static ref FEED_POSTS_RETURNED: HistogramVec = register_histogram_vec!(
        "feed_posts_returned",
        "Number of posts returned per feed tag",
        &["tag"],
        vec![0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0]
    )
    .expect("failed to register feed_posts_returned");

    pub static ref CASCADE_DELETE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cascade_delete_total",
        "Cascade deletions segmented by entity and result",
        &["entity", "result"]
    )
    .expect("failed to register cascade_delete_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
