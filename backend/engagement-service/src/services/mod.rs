//! Engine services. Each holds an `Arc<dyn DocumentStore>` and nothing else
//! mutable.

pub mod cascade;
pub mod engagement;
pub mod feed;
pub mod populate;
pub mod relation_store;

pub use cascade::{CascadeDeleter, CascadeReport};
pub use engagement::EngagementService;
pub use feed::FeedAggregator;
pub use populate::{populate_owner, populate_owners};
pub use relation_store::RelationStore;
