use async_graphql::*;
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::blog::archive::{ArchiveEntry, ArchiveMonth};
use crate::blog::reactions::{ReactionCount, ReactionKind, ReactionSummary};
use crate::blog::{comments, text, views};
use crate::db::models::{Author, Comment, Post};

fn to_utc(db_time: &str) -> Option<DateTime<Utc>> {
    text::parse_db_time(db_time).map(|dt| dt.and_utc())
}

/// A blog post
#[derive(Clone, Debug, SimpleObject)]
#[graphql(complex, name = "Post")]
pub struct PostObject {
    pub id: String,
    pub title: String,

    /// Plain text, paragraphs separated by newlines
    pub content: String,

    pub image_url: Option<String>,
    pub is_hidden: bool,
    pub author_id: Option<String>,

    /// Display name, "Anonymous" when the author is gone
    pub author_name: String,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Post> for PostObject {
    fn from(post: Post) -> Self {
        Self {
            author_name: post.author_display_name().to_string(),
            created_at: to_utc(&post.created_at),
            updated_at: to_utc(&post.updated_at),
            id: post.id,
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            is_hidden: post.is_hidden,
            author_id: post.author_id,
        }
    }
}

#[ComplexObject]
impl PostObject {
    /// First 200 characters of the content
    async fn excerpt(&self) -> String {
        text::excerpt(&self.content)
    }

    /// Number of distinct visitors who opened the post
    async fn view_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let pool = ctx.data::<Pool<SqliteConnectionManager>>()?;
        let conn = pool.get()?;
        Ok(views::count_views(&conn, &self.id)?)
    }

    async fn comment_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let pool = ctx.data::<Pool<SqliteConnectionManager>>()?;
        let conn = pool.get()?;
        Ok(comments::count_comments(&conn, &self.id)?)
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Comment")]
pub struct CommentObject {
    pub id: String,
    pub post_id: String,
    pub author_name: String,
    pub author_id: Option<String>,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Comment> for CommentObject {
    fn from(comment: Comment) -> Self {
        Self {
            created_at: to_utc(&comment.created_at),
            id: comment.id,
            post_id: comment.post_id,
            author_name: comment.author_name,
            author_id: comment.author_id,
            content: comment.content,
        }
    }
}

/// Reaction kinds, in display order
#[derive(Clone, Copy, Debug, Enum, Eq, PartialEq)]
pub enum Reaction {
    Like,
    Love,
    Haha,
    Wow,
    Sad,
    Angry,
}

impl From<ReactionKind> for Reaction {
    fn from(kind: ReactionKind) -> Self {
        match kind {
            ReactionKind::Like => Reaction::Like,
            ReactionKind::Love => Reaction::Love,
            ReactionKind::Haha => Reaction::Haha,
            ReactionKind::Wow => Reaction::Wow,
            ReactionKind::Sad => Reaction::Sad,
            ReactionKind::Angry => Reaction::Angry,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "ReactionCount")]
pub struct ReactionCountObject {
    pub kind: Reaction,
    pub emoji: String,
    pub count: i64,
}

impl From<ReactionCount> for ReactionCountObject {
    fn from(count: ReactionCount) -> Self {
        Self {
            kind: count.kind.into(),
            emoji: count.kind.emoji().to_string(),
            count: count.count,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "ReactionSummary")]
pub struct ReactionSummaryObject {
    /// Non-zero kinds only
    pub counts: Vec<ReactionCountObject>,
    pub total: i64,

    /// The signed-in caller's reaction, if any
    pub mine: Option<Reaction>,
}

impl From<ReactionSummary> for ReactionSummaryObject {
    fn from(summary: ReactionSummary) -> Self {
        Self {
            counts: summary.counts.into_iter().map(Into::into).collect(),
            total: summary.total,
            mine: summary.mine.map(Into::into),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Author")]
pub struct AuthorObject {
    pub user_id: String,
    pub full_name: String,
    pub post_count: i64,
}

impl From<Author> for AuthorObject {
    fn from(author: Author) -> Self {
        Self {
            user_id: author.user_id,
            full_name: author.full_name,
            post_count: author.post_count,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "ArchiveEntry")]
pub struct ArchiveEntryObject {
    pub id: String,
    pub title: String,
    pub day: String,
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "ArchiveMonth")]
pub struct ArchiveMonthObject {
    pub label: String,
    pub entries: Vec<ArchiveEntryObject>,
}

impl From<ArchiveMonth> for ArchiveMonthObject {
    fn from(month: ArchiveMonth) -> Self {
        Self {
            label: month.label,
            entries: month
                .entries
                .into_iter()
                .map(|e: ArchiveEntry| ArchiveEntryObject {
                    id: e.id,
                    title: e.title,
                    day: e.day,
                })
                .collect(),
        }
    }
}
