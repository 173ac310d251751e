use crate::core::articles::article_store::sort_snapshot;
use crate::core::articles::{Article, ArticleDraft, ArticleId, ArticleStore, Mutation, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// On-disk layout: { "articles": [Article, ...] }, oldest first.
#[derive(Debug, Serialize, Deserialize, Default)]
struct JsonStoreData {
    articles: Vec<Article>,
}

/// JSON-file article store. The whole collection is cached in memory and the
/// file is rewritten after every change.
///
/// Writers are serialised by the cache lock; a failed write rolls the cache
/// back so readers never observe a change that did not reach disk.
pub struct JsonArticleStore {
    path: PathBuf,
    cache: RwLock<HashMap<ArticleId, Article>>,
}

impl JsonArticleStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data: JsonStoreData = if path.exists() {
            let file = File::open(&path)?;
            serde_json::from_reader(BufReader::new(file))?
        } else {
            JsonStoreData::default()
        };

        let cache = data
            .articles
            .into_iter()
            .map(|article| (article.id, article))
            .collect();

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    async fn persist(&self, cache: &HashMap<ArticleId, Article>) -> Result<(), StoreError> {
        let mut articles: Vec<Article> = cache.values().cloned().collect();
        sort_snapshot(&mut articles);
        let bytes = serde_json::to_vec_pretty(&JsonStoreData { articles })?;

        // Write beside the target and rename so a crash never leaves half a file
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for JsonArticleStore {
    async fn create(&self, draft: ArticleDraft) -> Result<Article, StoreError> {
        let article = Article::publish(ArticleId::generate(), draft, Utc::now())?;

        let mut cache = self.cache.write().await;
        cache.insert(article.id, article.clone());
        if let Err(err) = self.persist(&cache).await {
            cache.remove(&article.id);
            return Err(err);
        }
        Ok(article)
    }

    async fn get(&self, id: &ArticleId) -> Result<Article, StoreError> {
        let cache = self.cache.read().await;
        cache.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }

    async fn commit(
        &self,
        id: &ArticleId,
        expected_version: u64,
        mutation: &Mutation,
    ) -> Result<Article, StoreError> {
        let mut cache = self.cache.write().await;
        let current = cache.get(id).ok_or(StoreError::NotFound(*id))?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                id: *id,
                expected: expected_version,
                found: current.version,
            });
        }

        let next = current.committed(mutation);
        let previous = cache.insert(*id, next.clone());
        if let Err(err) = self.persist(&cache).await {
            if let Some(previous) = previous {
                cache.insert(*id, previous);
            }
            return Err(err);
        }
        Ok(next)
    }

    async fn delete(&self, id: &ArticleId) -> Result<(), StoreError> {
        let mut cache = self.cache.write().await;
        let removed = cache.remove(id).ok_or(StoreError::NotFound(*id))?;
        if let Err(err) = self.persist(&cache).await {
            cache.insert(*id, removed);
            return Err(err);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Article>, StoreError> {
        let cache = self.cache.read().await;
        let mut articles: Vec<Article> = cache.values().cloned().collect();
        sort_snapshot(&mut articles);
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    fn draft() -> ArticleDraft {
        ArticleDraft {
            title: "Plants".into(),
            author: "ana@example.com".into(),
            content: "Water weekly.".into(),
            image_url: Some("https://img.example/fern.png".into()),
        }
    }

    #[tokio::test]
    async fn test_json_persistence_roundtrip() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);

        let store = JsonArticleStore::new(path.clone()).unwrap();
        let article = store.create(draft()).await.unwrap();
        store.commit(&article.id, 1, &Mutation::Like).await.unwrap();
        store
            .commit(&article.id, 2, &Mutation::Comment("Nice".into()))
            .await
            .unwrap();
        store
            .commit(&article.id, 3, &Mutation::SetReported(true))
            .await
            .unwrap();

        // Reload from file
        let store2 = JsonArticleStore::new(path.clone()).unwrap();
        let reloaded = store2.get(&article.id).await.unwrap();
        assert_eq!(reloaded.likes, 1);
        assert_eq!(reloaded.comments, vec!["Nice"]);
        assert_eq!(reloaded.version, 4);
        assert_eq!(reloaded.image_url.as_deref(), Some("https://img.example/fern.png"));
        assert_eq!(store2.list_reported().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let dir = tempdir().unwrap();
        let store = JsonArticleStore::new(dir.path().join("articles.json")).unwrap();
        let article = store.create(draft()).await.unwrap();
        store.commit(&article.id, 1, &Mutation::Dislike).await.unwrap();

        assert!(matches!(
            store.commit(&article.id, 1, &Mutation::Dislike).await,
            Err(StoreError::Conflict { found: 2, .. })
        ));
        assert_eq!(store.get(&article.id).await.unwrap().dislikes, 1);
    }

    #[tokio::test]
    async fn deleted_articles_stay_deleted_after_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("articles.json");
        let store = JsonArticleStore::new(path.clone()).unwrap();
        let keep = store.create(draft()).await.unwrap();
        let gone = store.create(draft()).await.unwrap();

        store.delete(&gone.id).await.unwrap();
        assert!(matches!(
            store.delete(&gone.id).await,
            Err(StoreError::NotFound(_))
        ));

        let reloaded = JsonArticleStore::new(path).unwrap();
        let ids: Vec<ArticleId> = reloaded.list().await.unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![keep.id]);
    }

    #[tokio::test]
    async fn failed_write_leaves_no_trace() {
        let dir = tempdir().unwrap();
        let store = JsonArticleStore::new(dir.path().join("missing").join("articles.json")).unwrap();

        assert!(matches!(store.create(draft()).await, Err(StoreError::Io(_))));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("articles.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonArticleStore::new(path),
            Err(StoreError::Serialization(_))
        ));
    }
}
