// Implementations of the ArticleStore port.

pub mod in_memory;
pub mod json_store;
pub mod sqlite_store;

pub use in_memory::InMemoryArticleStore;
pub use json_store::JsonArticleStore;
pub use sqlite_store::SqliteArticleStore;
