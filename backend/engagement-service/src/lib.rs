/// Engagement Service Library
///
/// Keeps follow, like and save relations between users, posts and comments
/// consistent, assembles the multi-tag home feed and cleans up references
/// when posts or comments are deleted.
///
/// # Modules
///
/// - `domain`: Documents, relation lists and feed types
/// - `repository`: Document store seam with in-memory and PostgreSQL backends
/// - `services`: Relation toggles, feed aggregation and cascade deletion
/// - `handlers`: HTTP endpoints
/// - `middleware`: Caller identity extraction
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
