use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::RelationField;
use crate::error::ServiceResult;
use crate::metrics::CASCADE_DELETE_TOTAL;
use crate::repository::DocumentStore;

/// Affected counts per cascade step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub saved_refs_removed: u64,
    pub liked_refs_removed: u64,
    pub comment_like_refs_removed: u64,
    pub comments_deleted: u64,
    pub deleted: bool,
}

/// Removes a post or comment together with every reference to it.
///
/// Steps run in a fixed order and each one is idempotent. There is no
/// transaction: a failure leaves the earlier steps applied and re-running
/// the same delete finishes the job.
#[derive(Clone)]
pub struct CascadeDeleter {
    store: Arc<dyn DocumentStore>,
}

impl CascadeDeleter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn delete_post(&self, post_id: Uuid) -> ServiceResult<CascadeReport> {
        let result = self.run_post_cascade(post_id).await;
        record("post", &result);

        let report = result?;
        info!(
            %post_id,
            saved = report.saved_refs_removed,
            liked = report.liked_refs_removed,
            comment_likes = report.comment_like_refs_removed,
            comments = report.comments_deleted,
            deleted = report.deleted,
            "post cascade complete"
        );
        Ok(report)
    }

    async fn run_post_cascade(&self, post_id: Uuid) -> ServiceResult<CascadeReport> {
        let mut report = CascadeReport {
            saved_refs_removed: self
                .store
                .set_remove_everywhere(RelationField::SavedPosts, post_id)
                .await?,
            liked_refs_removed: self
                .store
                .set_remove_everywhere(RelationField::LikedPosts, post_id)
                .await?,
            ..Default::default()
        };

        let comment_ids = self.store.find_comment_ids_by_post(post_id).await?;
        let pulls = comment_ids.into_iter().map(|comment_id| {
            self.store
                .set_remove_everywhere(RelationField::LikedComments, comment_id)
        });
        report.comment_like_refs_removed = try_join_all(pulls).await?.into_iter().sum();

        report.comments_deleted = self.store.delete_comments_by_post(post_id).await?;
        report.deleted = self.store.delete_post(post_id).await?;
        Ok(report)
    }

    pub async fn delete_comment(&self, comment_id: Uuid) -> ServiceResult<CascadeReport> {
        let result = self.run_comment_cascade(comment_id).await;
        record("comment", &result);

        let report = result?;
        info!(
            %comment_id,
            comment_likes = report.comment_like_refs_removed,
            deleted = report.deleted,
            "comment cascade complete"
        );
        Ok(report)
    }

    async fn run_comment_cascade(&self, comment_id: Uuid) -> ServiceResult<CascadeReport> {
        let comment_like_refs_removed = self
            .store
            .set_remove_everywhere(RelationField::LikedComments, comment_id)
            .await?;
        let deleted = self.store.delete_comment(comment_id).await?;

        Ok(CascadeReport {
            comment_like_refs_removed,
            comments_deleted: u64::from(deleted),
            deleted,
            ..Default::default()
        })
    }
}

fn record(entity: &'static str, result: &ServiceResult<CascadeReport>) {
    let label = match result {
        Ok(report) if report.deleted => "deleted",
        Ok(_) => "noop",
        Err(err) => {
            warn!(entity, error = %err, "cascade delete aborted; re-run to converge");
            "failed"
        }
    };
    CASCADE_DELETE_TOTAL.with_label_values(&[entity, label]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockDocumentStore, StoreError};

    #[tokio::test]
    async fn failed_step_stops_the_cascade() {
        let mut mock = MockDocumentStore::new();
        mock.expect_set_remove_everywhere()
            .withf(|field, _| *field == RelationField::SavedPosts)
            .times(1)
            .returning(|_, _| Ok(2));
        mock.expect_set_remove_everywhere()
            .withf(|field, _| *field == RelationField::LikedPosts)
            .times(1)
            .returning(|_, _| Err(StoreError::Unavailable("timeout".into())));
        mock.expect_delete_post().never();
        mock.expect_delete_comments_by_post().never();

        let deleter = CascadeDeleter::new(Arc::new(mock));
        assert!(deleter.delete_post(Uuid::new_v4()).await.is_err());
    }
}
