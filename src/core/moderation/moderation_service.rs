// Moderation view - read-only projection over reported articles.
//
// This service handles:
// - Listing every article currently flagged as reported
// - Gating that list to admins for the review surface
//
// It never mutates; unreporting and deleting are engagement operations.

use crate::core::articles::{Article, ArticleStore, EngagementError, SessionContext};

/// Admin review surface over the article store.
pub struct ModerationService<S: ArticleStore> {
    store: S,
}

impl<S: ArticleStore> ModerationService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Every article flagged as reported at call time.
    pub async fn list_reported(&self) -> Result<Vec<Article>, EngagementError> {
        Ok(self.store.list_reported().await?)
    }

    /// The reported list, restricted to admins.
    pub async fn review_queue(
        &self,
        caller: &SessionContext,
    ) -> Result<Vec<Article>, EngagementError> {
        if !caller.is_admin() {
            return Err(EngagementError::Forbidden(
                "only admins can review reported articles".to_string(),
            ));
        }

        let queue = self.list_reported().await?;
        tracing::debug!(
            reviewer = %caller.identity,
            pending = queue.len(),
            "Loaded moderation queue"
        );
        Ok(queue)
    }

    #[allow(dead_code)]
    pub async fn reported_count(&self) -> Result<usize, EngagementError> {
        Ok(self.list_reported().await?.len())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::articles::test_support::{draft_by, MockArticleStore};
    use crate::core::articles::{EngagementService, Role};
    use std::sync::Arc;

    fn services() -> (
        EngagementService<Arc<MockArticleStore>>,
        ModerationService<Arc<MockArticleStore>>,
    ) {
        let store = Arc::new(MockArticleStore::new());
        (
            EngagementService::new(Arc::clone(&store)),
            ModerationService::new(store),
        )
    }

    #[tokio::test]
    async fn reported_articles_appear_until_unreported() {
        let (engagement, moderation) = services();
        let flagged = engagement
            .publish(draft_by("ana@example.com", "Flagged"))
            .await
            .unwrap()
            .id;
        let clean = engagement
            .publish(draft_by("bo@example.com", "Clean"))
            .await
            .unwrap()
            .id;

        engagement.report(&flagged).await.unwrap();
        let reported = moderation.list_reported().await.unwrap();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].id, flagged);
        assert!(reported.iter().all(|a| a.id != clean));

        engagement.unreport(&flagged).await.unwrap();
        assert!(moderation.list_reported().await.unwrap().is_empty());
        assert_eq!(moderation.reported_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn review_queue_is_admin_only() {
        let (engagement, moderation) = services();
        let id = engagement
            .publish(draft_by("ana@example.com", "Flagged"))
            .await
            .unwrap()
            .id;
        engagement.report(&id).await.unwrap();

        let user = SessionContext::new("ana@example.com", Role::User);
        assert!(matches!(
            moderation.review_queue(&user).await,
            Err(EngagementError::Forbidden(_))
        ));

        let admin = SessionContext::new("root@example.com", Role::Admin);
        let queue = moderation.review_queue(&admin).await.unwrap();
        assert_eq!(queue.len(), 1);
        assert!(queue[0].reported);
    }

    #[tokio::test]
    async fn deleted_reported_article_leaves_the_queue() {
        let (engagement, moderation) = services();
        let id = engagement
            .publish(draft_by("ana@example.com", "Flagged"))
            .await
            .unwrap()
            .id;
        engagement.report(&id).await.unwrap();
        assert_eq!(moderation.reported_count().await.unwrap(), 1);

        let admin = SessionContext::new("root@example.com", Role::Admin);
        engagement.delete(&id, &admin).await.unwrap();
        assert_eq!(moderation.reported_count().await.unwrap(), 0);
    }
}
