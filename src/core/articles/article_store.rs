// Storage port for articles.
//
// The core defines what it needs from persistence; the infra layer provides
// in-memory, JSON file and SQLite implementations of this trait.

use super::article_models::{Article, ArticleDraft, ArticleId, Mutation, ValidationError};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Article {0} not found")]
    NotFound(ArticleId),

    #[error("Version conflict on article {id}: expected {expected}, found {found}")]
    Conflict {
        id: ArticleId,
        expected: u64,
        found: u64,
    },

    #[error("Invalid article: {0}")]
    Invalid(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Durable collection of article records.
///
/// `commit` is the only way a stored record changes after creation. It must be
/// atomic per article: load, compare `expected_version`, apply the mutation and
/// persist as one unit, or fail without side effects.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Persist a new article with a fresh id, version 1 and zeroed counters.
    async fn create(&self, draft: ArticleDraft) -> Result<Article, StoreError>;

    async fn get(&self, id: &ArticleId) -> Result<Article, StoreError>;

    /// Apply `mutation` if the stored version still equals `expected_version`.
    /// Returns the new record, whose version is `expected_version + 1`.
    async fn commit(
        &self,
        id: &ArticleId,
        expected_version: u64,
        mutation: &Mutation,
    ) -> Result<Article, StoreError>;

    /// Remove an article permanently. Deleting an absent id is `NotFound`.
    async fn delete(&self, id: &ArticleId) -> Result<(), StoreError>;

    /// Snapshot of every article, oldest first.
    async fn list(&self) -> Result<Vec<Article>, StoreError>;

    /// Snapshot of every article currently flagged as reported.
    async fn list_reported(&self) -> Result<Vec<Article>, StoreError> {
        let mut articles = self.list().await?;
        articles.retain(|article| article.reported);
        Ok(articles)
    }
}

/// Orders a snapshot by creation time, falling back to id for equal timestamps.
pub fn sort_snapshot(articles: &mut [Article]) {
    articles.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

// Lets one backend be shared by the engagement and moderation services.
#[async_trait]
impl<S: ArticleStore + ?Sized> ArticleStore for Arc<S> {
    async fn create(&self, draft: ArticleDraft) -> Result<Article, StoreError> {
        (**self).create(draft).await
    }

    async fn get(&self, id: &ArticleId) -> Result<Article, StoreError> {
        (**self).get(id).await
    }

    async fn commit(
        &self,
        id: &ArticleId,
        expected_version: u64,
        mutation: &Mutation,
    ) -> Result<Article, StoreError> {
        (**self).commit(id, expected_version, mutation).await
    }

    async fn delete(&self, id: &ArticleId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }

    async fn list(&self) -> Result<Vec<Article>, StoreError> {
        (**self).list().await
    }

    async fn list_reported(&self) -> Result<Vec<Article>, StoreError> {
        (**self).list_reported().await
    }
}
