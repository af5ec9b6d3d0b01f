use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Form, Router};
use serde::Deserialize;

use crate::blog::comments::{self, CommentDraft};
use crate::blog::{posts, text, Viewer};
use crate::db::models::Comment;
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::routes::home::Html;
use crate::routes::toast;
use crate::state::AppState;

pub struct CommentView {
    pub id: String,
    pub author_name: String,
    pub initials: String,
    pub content: String,
    pub created_at: String,
    pub can_delete: bool,
}

impl CommentView {
    pub fn new(comment: &Comment, viewer: &Viewer) -> Self {
        Self {
            id: comment.id.clone(),
            author_name: comment.author_name.clone(),
            initials: text::initials(&comment.author_name),
            content: comment.content.clone(),
            created_at: text::parse_and_format_time(&comment.created_at),
            can_delete: viewer.can_manage(comment.author_id.as_deref()),
        }
    }
}

#[derive(Template)]
#[template(path = "components/comment_list.html")]
pub struct CommentListTemplate {
    pub comments: Vec<CommentView>,
}

#[derive(Template)]
#[template(path = "components/comment.html")]
pub struct CommentTemplate {
    pub comment: CommentView,
}

#[derive(Deserialize)]
pub struct CreateCommentForm {
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub content: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/posts/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/comments/{id}", delete(delete_comment))
}

async fn list_comments(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(post_id): Path<String>,
) -> AppResult<Html<CommentListTemplate>> {
    let viewer = user.viewer();
    let conn = state.db.get()?;
    if posts::visible_post(&conn, &post_id, &viewer)?.is_none() {
        return Err(AppError::NotFound);
    }

    let comments = comments::list_comments(&conn, &post_id)?
        .iter()
        .map(|c| CommentView::new(c, &viewer))
        .collect();

    Ok(Html(CommentListTemplate { comments }))
}

async fn create_comment(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(post_id): Path<String>,
    Form(form): Form<CreateCommentForm>,
) -> AppResult<Response> {
    let draft = CommentDraft::new(&form.author_name, &form.content)?;
    let viewer = user.viewer();

    let comment = {
        let conn = state.db.get()?;
        if posts::visible_post(&conn, &post_id, &viewer)?.is_none() {
            return Err(AppError::NotFound);
        }
        comments::insert_comment(&conn, &post_id, viewer.user_id.as_deref(), &draft)?
    };

    Ok((
        StatusCode::CREATED,
        toast("Comment posted"),
        Html(CommentTemplate {
            comment: CommentView::new(&comment, &viewer),
        }),
    )
        .into_response())
}

async fn delete_comment(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let user = user.require("Sign in to manage comments")?;
    let conn = state.db.get()?;

    let comment = comments::get_comment(&conn, &id)?.ok_or(AppError::NotFound)?;
    if !user.viewer().can_manage(comment.author_id.as_deref()) {
        return Err(AppError::Forbidden);
    }

    comments::delete_comment(&conn, &id)?;
    Ok((toast("Comment deleted"), "").into_response())
}
