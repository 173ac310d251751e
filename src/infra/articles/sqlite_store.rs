// SQLite-backed article store.
//
// Tables:
// - articles: one row per article, comments kept as a JSON array
//
// Commits are compare-and-swap updates: the row is only rewritten when its
// version still matches the one the caller observed.

use crate::core::articles::{Article, ArticleDraft, ArticleId, ArticleStore, Mutation, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

const SELECT_COLUMNS: &str = r#"
    SELECT id, title, author, content, image_url, likes, dislikes,
           rating_sum, rating_count, comments, reported, created_at, version
    FROM articles
"#;

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

pub struct SqliteArticleStore {
    pool: SqlitePool,
}

impl SqliteArticleStore {
    /// Open (creating if needed) the database file at `database_path`.
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        let connection_string = format!("sqlite://{}?mode=rwc", database_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create tables.
    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                content TEXT NOT NULL,
                image_url TEXT,
                likes INTEGER NOT NULL DEFAULT 0,
                dislikes INTEGER NOT NULL DEFAULT 0,
                rating_sum INTEGER NOT NULL DEFAULT 0,
                rating_count INTEGER NOT NULL DEFAULT 0,
                comments TEXT NOT NULL DEFAULT '[]',
                reported BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_articles_reported
            ON articles(reported)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    fn row_to_article(row: &SqliteRow) -> Result<Article, StoreError> {
        let id: String = row.get("id");
        let id = id.parse::<ArticleId>().map_err(StoreError::Backend)?;

        let comments: String = row.get("comments");
        let created_at: String = row.get("created_at");
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StoreError::Backend(format!("bad created_at for {}: {}", id, e)))?
            .with_timezone(&Utc);

        Ok(Article {
            id,
            title: row.get("title"),
            author: row.get("author"),
            content: row.get("content"),
            image_url: row.get("image_url"),
            likes: row.get::<i64, _>("likes") as u64,
            dislikes: row.get::<i64, _>("dislikes") as u64,
            rating_sum: row.get::<i64, _>("rating_sum") as u64,
            rating_count: row.get::<i64, _>("rating_count") as u64,
            comments: serde_json::from_str(&comments)?,
            reported: row.get::<bool, _>("reported"),
            created_at,
            version: row.get::<i64, _>("version") as u64,
        })
    }

    async fn fetch(&self, id: &ArticleId) -> Result<Option<Article>, StoreError> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.as_ref().map(Self::row_to_article).transpose()
    }

    async fn fetch_many(&self, filter: &str) -> Result<Vec<Article>, StoreError> {
        let rows = sqlx::query(&format!(
            "{} {} ORDER BY created_at ASC, id ASC",
            SELECT_COLUMNS, filter
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(Self::row_to_article).collect()
    }
}

#[async_trait]
impl ArticleStore for SqliteArticleStore {
    async fn create(&self, draft: ArticleDraft) -> Result<Article, StoreError> {
        let article = Article::publish(ArticleId::generate(), draft, Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO articles (id, title, author, content, image_url, comments, created_at, version)
            VALUES (?, ?, ?, ?, ?, '[]', ?, ?)
            "#,
        )
        .bind(article.id.to_string())
        .bind(&article.title)
        .bind(&article.author)
        .bind(&article.content)
        .bind(&article.image_url)
        .bind(article.created_at.to_rfc3339())
        .bind(article.version as i64)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(article)
    }

    async fn get(&self, id: &ArticleId) -> Result<Article, StoreError> {
        self.fetch(id).await?.ok_or(StoreError::NotFound(*id))
    }

    async fn commit(
        &self,
        id: &ArticleId,
        expected_version: u64,
        mutation: &Mutation,
    ) -> Result<Article, StoreError> {
        let current = self.get(id).await?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                id: *id,
                expected: expected_version,
                found: current.version,
            });
        }

        let next = current.committed(mutation);
        let comments = serde_json::to_string(&next.comments)?;

        let result = sqlx::query(
            r#"
            UPDATE articles
            SET content = ?, image_url = ?, likes = ?, dislikes = ?,
                rating_sum = ?, rating_count = ?, comments = ?, reported = ?,
                version = ?
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(&next.content)
        .bind(&next.image_url)
        .bind(next.likes as i64)
        .bind(next.dislikes as i64)
        .bind(next.rating_sum as i64)
        .bind(next.rating_count as i64)
        .bind(comments)
        .bind(next.reported)
        .bind(next.version as i64)
        .bind(id.to_string())
        .bind(expected_version as i64)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            // Someone else committed (or deleted) between our read and write
            return match self.fetch(id).await? {
                Some(winner) => Err(StoreError::Conflict {
                    id: *id,
                    expected: expected_version,
                    found: winner.version,
                }),
                None => Err(StoreError::NotFound(*id)),
            };
        }

        Ok(next)
    }

    async fn delete(&self, id: &ArticleId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(*id));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Article>, StoreError> {
        self.fetch_many("").await
    }

    async fn list_reported(&self) -> Result<Vec<Article>, StoreError> {
        self.fetch_many("WHERE reported = 1").await
    }
}
