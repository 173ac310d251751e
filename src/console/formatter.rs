use super::commands::Reply;
use crate::core::articles::Article;
use serde::Serialize;
use std::fmt::Write;

/// Article record plus its derived average, for JSON output.
#[derive(Serialize)]
struct ArticleView<'a> {
    #[serde(flatten)]
    article: &'a Article,
    rating: f64,
}

impl<'a> From<&'a Article> for ArticleView<'a> {
    fn from(article: &'a Article) -> Self {
        Self {
            article,
            rating: article.rating(),
        }
    }
}

pub fn render(reply: &Reply, json: bool) -> Result<String, serde_json::Error> {
    if json {
        return render_json(reply);
    }

    Ok(match reply {
        Reply::Article(article) => format_article(article),
        Reply::Articles { heading, articles } => format_listing(heading, articles),
        Reply::Deleted(id) => format!("Deleted article {}", id),
    })
}

fn render_json(reply: &Reply) -> Result<String, serde_json::Error> {
    match reply {
        Reply::Article(article) => serde_json::to_string_pretty(&ArticleView::from(article)),
        Reply::Articles { articles, .. } => {
            let views: Vec<ArticleView> = articles.iter().map(ArticleView::from).collect();
            serde_json::to_string_pretty(&views)
        }
        Reply::Deleted(id) => serde_json::to_string_pretty(&serde_json::json!({ "deleted": id })),
    }
}

fn format_rating(article: &Article) -> String {
    match article.rating_count {
        0 => "no ratings".to_string(),
        1 => format!("{:.1} (1 vote)", article.rating()),
        n => format!("{:.1} ({} votes)", article.rating(), n),
    }
}

pub fn format_article(article: &Article) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} by {}", article.title, article.author);
    let _ = writeln!(out, "  id: {}", article.id);
    let _ = writeln!(
        out,
        "  published: {}",
        article.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    if let Some(url) = &article.image_url {
        let _ = writeln!(out, "  image: {}", url);
    }
    let _ = writeln!(
        out,
        "  likes: {}  dislikes: {}  rating: {}",
        article.likes,
        article.dislikes,
        format_rating(article)
    );
    if article.reported {
        let _ = writeln!(out, "  REPORTED for review");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", article.content);

    if !article.comments.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Comments ({}):", article.comments.len());
        for (i, comment) in article.comments.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, comment);
        }
    }

    out.trim_end().to_string()
}

fn format_listing(heading: &str, articles: &[Article]) -> String {
    if articles.is_empty() {
        return format!("{}: none", heading);
    }

    let mut out = format!("{} ({}):", heading, articles.len());
    for article in articles {
        let flag = if article.reported { " [reported]" } else { "" };
        let _ = write!(
            out,
            "\n  {}  {} by {}  +{} -{}  {}{}",
            article.id,
            article.title,
            article.author,
            article.likes,
            article.dislikes,
            format_rating(article),
            flag
        );
    }
    out
}
