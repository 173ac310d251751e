// Articles core - the published record, its storage port and the engagement engine.

pub mod article_models;
pub mod article_store;
pub mod engagement_service;

#[cfg(test)]
pub mod test_support;

pub use article_models::{
    Article, ArticleDraft, ArticleId, Mutation, Rating, Role, SessionContext, ValidationError,
};
pub use article_store::{ArticleStore, StoreError};
pub use engagement_service::{EngagementConfig, EngagementError, EngagementService};
