// Console commands for the article engine.
//
// **Notice the pattern:**
// 1. Extract primitive data from the command line
// 2. Call core service
// 3. Hand the result to the formatter
//
// This layer is THIN - no business logic, just translation.

use crate::core::articles::{
    Article, ArticleDraft, ArticleId, ArticleStore, EngagementError, EngagementService, Role,
    SessionContext,
};
use crate::core::moderation::ModerationService;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use thiserror::Error;

/// Store shared by every service; the backend is chosen at startup.
pub type SharedStore = Arc<dyn ArticleStore>;

/// Services available to every command.
pub struct Data {
    pub engagement: Arc<EngagementService<SharedStore>>,
    pub moderation: Arc<ModerationService<SharedStore>>,
}

impl Data {
    pub fn new(store: SharedStore, engagement: EngagementService<SharedStore>) -> Self {
        Self {
            engagement: Arc::new(engagement),
            moderation: Arc::new(ModerationService::new(store)),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "articles", version, about = "Publish, rate and moderate short articles")]
pub struct Cli {
    /// Verified identity of the caller (e.g. an email address)
    #[arg(long = "as", env = "BLOG_IDENTITY", global = true)]
    pub identity: Option<String>,

    /// Role of the caller: user or admin
    #[arg(long, env = "BLOG_ROLE", default_value = "user", global = true)]
    pub role: Role,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn session(&self) -> Option<SessionContext> {
        self.identity
            .as_deref()
            .map(str::trim)
            .filter(|identity| !identity.is_empty())
            .map(|identity| SessionContext::new(identity, self.role))
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Publish a new article as the current identity
    Publish {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Show one article
    Show { id: ArticleId },
    /// List every article, oldest first
    List,
    Like { id: ArticleId },
    Dislike { id: ArticleId },
    /// Rate an article from 1 to 5 stars
    Rate {
        id: ArticleId,
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
    Comment { id: ArticleId, text: String },
    /// Flag an article for admin review
    Report { id: ArticleId },
    /// Clear the review flag
    Unreport { id: ArticleId },
    /// Replace the content of your own article
    Edit {
        id: ArticleId,
        #[arg(long)]
        content: String,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Delete an article (author or admin)
    Delete { id: ArticleId },
    /// List reported articles (admin only)
    Reported,
}

/// What a command produced, ready for formatting.
#[derive(Debug, Clone)]
pub enum Reply {
    Article(Article),
    Articles {
        heading: &'static str,
        articles: Vec<Article>,
    },
    Deleted(ArticleId),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("This command needs an identity: pass --as <email> or set BLOG_IDENTITY")]
    MissingIdentity,

    #[error(transparent)]
    Engagement(#[from] EngagementError),
}

impl CommandError {
    /// Distinct exit status per failure kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            CommandError::MissingIdentity => 2,
            CommandError::Engagement(err) => match err {
                EngagementError::Validation(_) => 2,
                EngagementError::NotFound(_) => 3,
                EngagementError::Forbidden(_) => 4,
                EngagementError::Conflict { .. } => 5,
                EngagementError::Storage(_) => 1,
            },
        }
    }
}

fn require_session(session: Option<SessionContext>) -> Result<SessionContext, CommandError> {
    session.ok_or(CommandError::MissingIdentity)
}

pub async fn execute(
    data: &Data,
    session: Option<SessionContext>,
    command: Command,
) -> Result<Reply, CommandError> {
    let engagement = &data.engagement;

    let reply = match command {
        Command::Publish {
            title,
            content,
            image_url,
        } => {
            let caller = require_session(session)?;
            let draft = ArticleDraft {
                title,
                author: caller.identity,
                content,
                image_url,
            };
            Reply::Article(engagement.publish(draft).await?)
        }
        Command::Show { id } => Reply::Article(engagement.get(&id).await?),
        Command::List => Reply::Articles {
            heading: "Articles",
            articles: engagement.list().await?,
        },
        Command::Like { id } => Reply::Article(engagement.like(&id).await?),
        Command::Dislike { id } => Reply::Article(engagement.dislike(&id).await?),
        Command::Rate { id, value } => Reply::Article(engagement.rate(&id, value).await?),
        Command::Comment { id, text } => Reply::Article(engagement.comment(&id, text).await?),
        Command::Report { id } => Reply::Article(engagement.report(&id).await?),
        Command::Unreport { id } => Reply::Article(engagement.unreport(&id).await?),
        Command::Edit {
            id,
            content,
            image_url,
        } => {
            let caller = require_session(session)?;
            Reply::Article(engagement.edit(&id, &caller, content, image_url).await?)
        }
        Command::Delete { id } => {
            let caller = require_session(session)?;
            engagement.delete(&id, &caller).await?;
            Reply::Deleted(id)
        }
        Command::Reported => {
            let caller = require_session(session)?;
            Reply::Articles {
                heading: "Reported articles",
                articles: data.moderation.review_queue(&caller).await?,
            }
        }
    };

    Ok(reply)
}
