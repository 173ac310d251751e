// Article domain models - the per-article record and the intents applied to it.
//
// These are pure domain types with no storage or CLI dependencies.
// Every store implementation builds records and successors through the helpers
// here, so the state transitions are defined exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Opaque, immutable identifier assigned to an article when it is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(Uuid);

impl ArticleId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArticleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| format!("'{}' is not a valid article id", s))
    }
}

// ============================================================================
// CALLER IDENTITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}' (expected user or admin)", other)),
        }
    }
}

/// The verified identity of whoever issued a request.
///
/// Supplied by the session layer and trusted as already authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub identity: String,
    pub role: Role,
}

impl SessionContext {
    pub fn new(identity: impl Into<String>, role: Role) -> Self {
        Self {
            identity: identity.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_author_of(&self, article: &Article) -> bool {
        self.identity == article.author
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Malformed input: an empty required field or an out-of-range rating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, "is required"))
    } else {
        Ok(())
    }
}

/// Blank image URLs mean "no image".
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A star rating, always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 5;

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::new(
                "rating",
                format!(
                    "must be between {} and {}, got {}",
                    Self::MIN,
                    Self::MAX,
                    value
                ),
            ))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// Everything needed to publish a new article.
#[derive(Debug, Clone, Default)]
pub struct ArticleDraft {
    pub title: String,
    pub author: String,
    pub content: String,
    pub image_url: Option<String>,
}

impl ArticleDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("author", &self.author)?;
        require_text("content", &self.content)?;
        Ok(())
    }
}

/// The shared per-article record.
///
/// Ratings are kept as an exact sum and count; the average is derived on read
/// with [`Article::rating`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub author: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub likes: u64,
    pub dislikes: u64,
    pub rating_sum: u64,
    pub rating_count: u64,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub reported: bool,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

impl Article {
    /// Build the first version of a record from a validated draft.
    pub fn publish(
        id: ArticleId,
        draft: ArticleDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        draft.validate()?;

        Ok(Self {
            id,
            title: draft.title,
            author: draft.author,
            content: draft.content,
            image_url: non_blank(draft.image_url),
            likes: 0,
            dislikes: 0,
            rating_sum: 0,
            rating_count: 0,
            comments: Vec::new(),
            reported: false,
            created_at,
            version: 1,
        })
    }

    /// Average star rating, or 0.0 when nobody has rated yet.
    pub fn rating(&self) -> f64 {
        if self.rating_count == 0 {
            0.0
        } else {
            self.rating_sum as f64 / self.rating_count as f64
        }
    }

    /// The record that results from committing `mutation` on top of this version.
    pub fn committed(&self, mutation: &Mutation) -> Self {
        let mut next = self.clone();
        mutation.apply(&mut next);
        next.version = self.version + 1;
        next
    }
}

// ============================================================================
// MUTATIONS
// ============================================================================

/// A single state transition on an article.
///
/// Expressed as data rather than a closure so every backend (including SQL)
/// can replay it against the record it loads inside `commit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Like,
    Dislike,
    Rate(Rating),
    Comment(String),
    SetReported(bool),
    Edit {
        content: String,
        image_url: Option<String>,
    },
}

impl Mutation {
    /// Build an edit, dropping blank image URLs so they never clear an existing one.
    pub fn edit(content: impl Into<String>, image_url: Option<String>) -> Self {
        Mutation::Edit {
            content: content.into(),
            image_url: non_blank(image_url),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mutation::Like => "like",
            Mutation::Dislike => "dislike",
            Mutation::Rate(_) => "rate",
            Mutation::Comment(_) => "comment",
            Mutation::SetReported(true) => "report",
            Mutation::SetReported(false) => "unreport",
            Mutation::Edit { .. } => "edit",
        }
    }

    fn apply(&self, article: &mut Article) {
        match self {
            Mutation::Like => article.likes = article.likes.saturating_add(1),
            Mutation::Dislike => article.dislikes = article.dislikes.saturating_add(1),
            Mutation::Rate(rating) => {
                article.rating_sum = article.rating_sum.saturating_add(rating.value() as u64);
                article.rating_count = article.rating_count.saturating_add(1);
            }
            Mutation::Comment(text) => article.comments.push(text.clone()),
            Mutation::SetReported(flag) => article.reported = *flag,
            Mutation::Edit { content, image_url } => {
                article.content = content.clone();
                if let Some(url) = image_url {
                    article.image_url = Some(url.clone());
                }
            }
        }
    }
}
