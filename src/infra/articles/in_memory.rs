// In-memory implementation of ArticleStore.
//
// Records live in a DashMap keyed by article id. A commit holds the write
// guard of that one entry while it compares versions and swaps in the
// successor, so writers on different articles never wait on each other.

use crate::core::articles::article_store::sort_snapshot;
use crate::core::articles::{Article, ArticleDraft, ArticleId, ArticleStore, Mutation, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

/// Concurrent in-process article store. Contents are lost on exit.
pub struct InMemoryArticleStore {
    articles: DashMap<ArticleId, Article>,
}

impl InMemoryArticleStore {
    pub fn new() -> Self {
        Self {
            articles: DashMap::new(),
        }
    }
}

impl Default for InMemoryArticleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleStore for InMemoryArticleStore {
    async fn create(&self, draft: ArticleDraft) -> Result<Article, StoreError> {
        let article = Article::publish(ArticleId::generate(), draft, Utc::now())?;
        self.articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn get(&self, id: &ArticleId) -> Result<Article, StoreError> {
        // Clone out of the guard so no shard lock outlives this call
        self.articles
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound(*id))
    }

    async fn commit(
        &self,
        id: &ArticleId,
        expected_version: u64,
        mutation: &Mutation,
    ) -> Result<Article, StoreError> {
        let mut entry = self
            .articles
            .get_mut(id)
            .ok_or(StoreError::NotFound(*id))?;

        if entry.version != expected_version {
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
        let mut articles: Vec<Article> = self
            .articles
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sort_snapshot(&mut articles);
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::articles::Rating;
    use std::sync::Arc;

    fn draft(title: &str) -> ArticleDraft {
        ArticleDraft {
            title: title.to_string(),
            author: "ana@example.com".to_string(),
            content: "Some words".to_string(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryArticleStore::new();

        let article = store.create(draft("First")).await.unwrap();
        assert_eq!(article.version, 1);

        let liked = store.commit(&article.id, 1, &Mutation::Like).await.unwrap();
        assert_eq!(liked.likes, 1);
        assert_eq!(liked.version, 2);

        let fetched = store.get(&article.id).await.unwrap();
        assert_eq!(fetched, liked);
    }

    #[tokio::test]
    async fn stale_commit_is_a_conflict_and_changes_nothing() {
        let store = InMemoryArticleStore::new();
        let article = store.create(draft("First")).await.unwrap();
        store.commit(&article.id, 1, &Mutation::Like).await.unwrap();

        let err = store
            .commit(&article.id, 1, &Mutation::Dislike)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: 1,
                found: 2,
                ..
            }
        ));

        let current = store.get(&article.id).await.unwrap();
        assert_eq!(current.dislikes, 0);
        assert_eq!(current.version, 2);
    }

    #[tokio::test]
    async fn create_rejects_blank_fields() {
        let store = InMemoryArticleStore::new();
        let mut bad = draft("Title");
        bad.author = " ".to_string();

        assert!(matches!(
            store.create(bad).await,
            Err(StoreError::Invalid(_))
        ));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_is_not_idempotent() {
        let store = InMemoryArticleStore::new();
        let article = store.create(draft("Gone")).await.unwrap();

        store.delete(&article.id).await.unwrap();
        assert!(matches!(
            store.delete(&article.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.commit(&article.id, 1, &Mutation::Like).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_reported_filters_flagged_articles() {
        let store = InMemoryArticleStore::new();
        let flagged = store.create(draft("Flagged")).await.unwrap();
        store.create(draft("Clean")).await.unwrap();

        store
            .commit(&flagged.id, 1, &Mutation::SetReported(true))
            .await
            .unwrap();

        let reported = store.list_reported().await.unwrap();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].id, flagged.id);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_commits_on_one_version_have_a_single_winner() {
        let store = Arc::new(InMemoryArticleStore::new());
        let id = store.create(draft("Contended")).await.unwrap().id;

        let mut handles = Vec::new();
        for value in 1..=5 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let rating = Rating::new(value).unwrap();
                store.commit(&id, 1, &Mutation::Rate(rating)).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(StoreError::Conflict { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(winners, 1);
        let article = store.get(&id).await.unwrap();
        assert_eq!(article.rating_count, 1);
        assert_eq!(article.version, 2);
    }
}
