// Engagement engine - applies likes, ratings, comments, moderation flags,
// edits and deletes to a single article.
//
// Every mutation follows the same shape:
// 1. Validate the input that needs no stored state
// 2. Load the current version through the store
// 3. Check authorization against that version
// 4. Commit with the observed version, retrying on conflict
//
// NO storage or CLI code here - the store is injected.

use super::article_models::{
    Article, ArticleDraft, ArticleId, Mutation, Rating, SessionContext, ValidationError,
};
use super::article_store::{ArticleStore, StoreError};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum EngagementError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Article {0} not found")]
    NotFound(ArticleId),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Article {id} is busy: gave up after {attempts} conflicting attempts")]
    Conflict { id: ArticleId, attempts: u32 },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for EngagementError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngagementError::NotFound(id),
            StoreError::Invalid(validation) => EngagementError::Validation(validation),
            StoreError::Conflict { id, .. } => EngagementError::Conflict { id, attempts: 1 },
            other => EngagementError::Storage(other.to_string()),
        }
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Retry behaviour for conflicting commits.
#[derive(Debug, Clone)]
pub struct EngagementConfig {
    /// How many times a conflicting commit is retried before giving up.
    pub max_retries: u32,

    /// Upper bound of the random pause before retry `n` is `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_backoff_ms: 10,
        }
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct EngagementService<S: ArticleStore> {
    store: S,
    config: EngagementConfig,
}

impl<S: ArticleStore> EngagementService<S> {
    #[allow(dead_code)]
    pub fn new(store: S) -> Self {
        Self::new_with_config(store, EngagementConfig::default())
    }

    pub fn new_with_config(store: S, config: EngagementConfig) -> Self {
        Self { store, config }
    }

    /// Publish a new article. The draft's author is taken as-is.
    pub async fn publish(&self, draft: ArticleDraft) -> Result<Article, EngagementError> {
        draft.validate()?;
        let article = self.store.create(draft).await?;

        tracing::info!(
            article_id = %article.id,
            author = %article.author,
            "Article published"
        );
        Ok(article)
    }

    pub async fn get(&self, id: &ArticleId) -> Result<Article, EngagementError> {
        Ok(self.store.get(id).await?)
    }

    /// Every article, oldest first.
    pub async fn list(&self) -> Result<Vec<Article>, EngagementError> {
        Ok(self.store.list().await?)
    }

    pub async fn like(&self, id: &ArticleId) -> Result<Article, EngagementError> {
        self.commit_with_retry(id, &Mutation::Like, None).await
    }

    pub async fn dislike(&self, id: &ArticleId) -> Result<Article, EngagementError> {
        self.commit_with_retry(id, &Mutation::Dislike, None).await
    }

    /// Add a 1-5 star rating to the article's running total.
    pub async fn rate(&self, id: &ArticleId, value: i64) -> Result<Article, EngagementError> {
        let rating = Rating::new(value)?;
        self.commit_with_retry(id, &Mutation::Rate(rating), None)
            .await
    }

    pub async fn comment(
        &self,
        id: &ArticleId,
        text: impl Into<String>,
    ) -> Result<Article, EngagementError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::new("comment", "must not be empty").into());
        }
        self.commit_with_retry(id, &Mutation::Comment(text), None)
            .await
    }

    pub async fn report(&self, id: &ArticleId) -> Result<Article, EngagementError> {
        let article = self
            .commit_with_retry(id, &Mutation::SetReported(true), None)
            .await?;
        tracing::info!(article_id = %id, "Article reported for review");
        Ok(article)
    }

    pub async fn unreport(&self, id: &ArticleId) -> Result<Article, EngagementError> {
        let article = self
            .commit_with_retry(id, &Mutation::SetReported(false), None)
            .await?;
        tracing::info!(article_id = %id, "Article cleared from review");
        Ok(article)
    }

    /// Replace the content (and optionally the image) of an article.
    /// Only the author may edit; the admin role grants no edit rights.
    pub async fn edit(
        &self,
        id: &ArticleId,
        caller: &SessionContext,
        content: impl Into<String>,
        image_url: Option<String>,
    ) -> Result<Article, EngagementError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::new("content", "is required").into());
        }
        let mutation = Mutation::edit(content, image_url);
        self.commit_with_retry(id, &mutation, Some(caller)).await
    }

    /// Delete an article. Allowed for its author or any admin.
    pub async fn delete(
        &self,
        id: &ArticleId,
        caller: &SessionContext,
    ) -> Result<(), EngagementError> {
        let article = self.store.get(id).await?;
        if !caller.is_admin() && !caller.is_author_of(&article) {
            return Err(EngagementError::Forbidden(
                "only the author or an admin can delete an article".to_string(),
            ));
        }

        self.store.delete(id).await?;
        tracing::info!(
            article_id = %id,
            deleted_by = %caller.identity,
            role = %caller.role,
            "Article deleted"
        );
        Ok(())
    }

    /// Load, check and commit `mutation`, re-reading and retrying when another
    /// writer commits first. `author_only` restricts the mutation to the
    /// article's author.
    async fn commit_with_retry(
        &self,
        id: &ArticleId,
        mutation: &Mutation,
        author_only: Option<&SessionContext>,
    ) -> Result<Article, EngagementError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let current = self.store.get(id).await?;

            if let Some(caller) = author_only {
                if !caller.is_author_of(&current) {
                    return Err(EngagementError::Forbidden(
                        "only the author can edit an article".to_string(),
                    ));
                }
            }

            match self.store.commit(id, current.version, mutation).await {
                Ok(article) => return Ok(article),
                Err(StoreError::Conflict {
                    expected, found, ..
                }) if attempt <= self.config.max_retries => {
                    tracing::debug!(
                        article_id = %id,
                        mutation = mutation.label(),
                        attempt,
                        expected,
                        found,
                        "Commit conflict, retrying"
                    );
                    self.backoff(attempt).await;
                }
                Err(StoreError::Conflict { .. }) => {
                    tracing::warn!(
                        article_id = %id,
                        mutation = mutation.label(),
                        attempts = attempt,
                        "Giving up after repeated commit conflicts"
                    );
                    return Err(EngagementError::Conflict {
                        id: *id,
                        attempts: attempt,
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn backoff(&self, attempt: u32) {
        let ceiling = self
            .config
            .retry_backoff_ms
            .saturating_mul(attempt as u64);
        if ceiling == 0 {
            tokio::task::yield_now().await;
            return;
        }

        let pause = rand::thread_rng().gen_range(0..=ceiling);
        tokio::time::sleep(Duration::from_millis(pause)).await;
    }
}

// ============================================================================
// TESTS
// ============================================================================
