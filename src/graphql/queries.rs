use async_graphql::*;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::blog::reactions::{self, ReactionSummary};
use crate::blog::{archive, comments, posts, profiles, views, Viewer};
use crate::graphql::types::{
    ArchiveMonthObject, AuthorObject, CommentObject, PostObject, ReactionSummaryObject,
};

/// The caller, or an anonymous reader when the request carries none.
fn viewer(ctx: &Context<'_>) -> Viewer {
    ctx.data_opt::<Viewer>().cloned().unwrap_or_default()
}

/// GraphQL Query root
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Posts the caller may see, newest first, optionally filtered by a search term
    async fn posts(&self, ctx: &Context<'_>, search: Option<String>) -> Result<Vec<PostObject>> {
        let pool = ctx.data::<Pool<SqliteConnectionManager>>()?;
        let conn = pool.get()?;

        let found = posts::list_posts(&conn, &viewer(ctx), search.as_deref())?;
        Ok(found.into_iter().map(Into::into).collect())
    }

    /// A single post, or null when it does not exist or is hidden from the caller
    async fn post(&self, ctx: &Context<'_>, id: String) -> Result<Option<PostObject>> {
        let pool = ctx.data::<Pool<SqliteConnectionManager>>()?;
        let conn = pool.get()?;

        Ok(posts::visible_post(&conn, &id, &viewer(ctx))?.map(Into::into))
    }

    /// Comments on a post, oldest first
    async fn comments(&self, ctx: &Context<'_>, post_id: String) -> Result<Vec<CommentObject>> {
        let pool = ctx.data::<Pool<SqliteConnectionManager>>()?;
        let conn = pool.get()?;

        if posts::visible_post(&conn, &post_id, &viewer(ctx))?.is_none() {
            return Ok(Vec::new());
        }
        let found = comments::list_comments(&conn, &post_id)?;
        Ok(found.into_iter().map(Into::into).collect())
    }

    async fn reaction_summary(
        &self,
        ctx: &Context<'_>,
        post_id: String,
    ) -> Result<ReactionSummaryObject> {
        let pool = ctx.data::<Pool<SqliteConnectionManager>>()?;
        let conn = pool.get()?;

        let viewer = viewer(ctx);
        if posts::visible_post(&conn, &post_id, &viewer)?.is_none() {
            return Ok(ReactionSummary::default().into());
        }
        let summary = reactions::summarize(&conn, &post_id, viewer.user_id.as_deref())?;
        Ok(summary.into())
    }

    /// Zero for posts the caller cannot see
    async fn view_count(&self, ctx: &Context<'_>, post_id: String) -> Result<i64> {
        let pool = ctx.data::<Pool<SqliteConnectionManager>>()?;
        let conn = pool.get()?;

        if posts::visible_post(&conn, &post_id, &viewer(ctx))?.is_none() {
            return Ok(0);
        }
        Ok(views::count_views(&conn, &post_id)?)
    }

    /// Authors with at least one visible post, most prolific first
    async fn authors(&self, ctx: &Context<'_>) -> Result<Vec<AuthorObject>> {
        let pool = ctx.data::<Pool<SqliteConnectionManager>>()?;
        let conn = pool.get()?;
        Ok(profiles::list_authors(&conn)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Visible posts grouped by month
    async fn archive(&self, ctx: &Context<'_>) -> Result<Vec<ArchiveMonthObject>> {
        let pool = ctx.data::<Pool<SqliteConnectionManager>>()?;
        let conn = pool.get()?;

        let visible = posts::list_posts(&conn, &Viewer::anonymous(), None)?;
        Ok(archive::group_by_month(&visible)
            .into_iter()
            .map(Into::into)
            .collect())
    }
}
