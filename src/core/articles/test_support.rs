// Test doubles for the ArticleStore port, shared by the core service tests.

use super::article_models::{Article, ArticleDraft, ArticleId, Mutation};
use super::article_store::{sort_snapshot, ArticleStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// In-memory store with hooks for forcing version conflicts.
pub struct MockArticleStore {
    articles: DashMap<ArticleId, Article>,
    /// How many upcoming commits should fail with a conflict.
    forced_conflicts: AtomicU32,
    /// Total commit calls seen, successful or not.
    commit_calls: AtomicU32,
}

impl MockArticleStore {
    pub fn new() -> Self {
        Self {
            articles: DashMap::new(),
            forced_conflicts: AtomicU32::new(0),
            commit_calls: AtomicU32::new(0),
        }
    }

    pub fn force_conflicts(&self, count: u32) {
        self.forced_conflicts.store(count, Ordering::SeqCst);
    }

    pub fn commits(&self) -> u32 {
        self.commit_calls.load(Ordering::SeqCst)
    }

    fn take_forced_conflict(&self) -> bool {
        self.forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ArticleStore for MockArticleStore {
    async fn create(&self, draft: ArticleDraft) -> Result<Article, StoreError> {
        let article = Article::publish(ArticleId::generate(), draft, Utc::now())?;
        self.articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn get(&self, id: &ArticleId) -> Result<Article, StoreError> {
        self.articles
            .get(id)
            .map(|entry| entry.clone())
            .ok_or(StoreError::NotFound(*id))
    }

    async fn commit(
        &self,
        id: &ArticleId,
        expected_version: u64,
        mutation: &Mutation,
    ) -> Result<Article, StoreError> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);

        let mut entry = self.articles.get_mut(id).ok_or(StoreError::NotFound(*id))?;
        if self.take_forced_conflict() || entry.version != expected_version {
            return Err(StoreError::Conflict {
                id: *id,
                expected: expected_version,
                found: entry.version,
            });
        }

        let next = entry.committed(mutation);
        *entry = next.clone();
        Ok(next)
    }

    async fn delete(&self, id: &ArticleId) -> Result<(), StoreError> {
        self.articles
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(*id))
    }

    async fn list(&self) -> Result<Vec<Article>, StoreError> {
        let mut articles: Vec<Article> = self.articles.iter().map(|e| e.value().clone()).collect();
        sort_snapshot(&mut articles);
        Ok(articles)
    }
}

pub fn draft_by(author: &str, title: &str) -> ArticleDraft {
    ArticleDraft {
        title: title.to_string(),
        author: author.to_string(),
        content: format!("{} by {}", title, author),
        image_url: None,
    }
}
