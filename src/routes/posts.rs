use askama::Template;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use rusqlite::Connection;
use serde::Serialize;

use crate::blog::posts::{self, PostDraft};
use crate::blog::reactions;
use crate::blog::text;
use crate::blog::views::{self, ViewOutcome};
use crate::blog::comments as blog_comments;
use crate::db::models::Post;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::comments::CommentView;
use crate::routes::home::Html;
use crate::routes::reactions::ReactionBar;
use crate::routes::{toast, Nav};
use crate::state::AppState;
use crate::uploads;
use crate::visitor::VisitorId;

// --- View structs ---

pub struct PostDetail {
    pub id: String,
    pub title: String,
    pub paragraphs: Vec<String>,
    pub image_url: Option<String>,
    pub author_id: Option<String>,
    pub author_name: String,
    pub author_initials: String,
    pub published: String,
    pub is_hidden: bool,
    pub can_manage: bool,
}

// --- Templates ---

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostTemplate {
    pub nav: Nav,
    pub post: PostDetail,
    pub views: i64,
    pub bar: ReactionBar,
    pub comments: Vec<CommentView>,
    pub comment_name: String,
}

#[derive(Template)]
#[template(path = "pages/edit_post.html")]
pub struct EditPostTemplate {
    pub nav: Nav,
    pub post: Post,
    pub uploads_enabled: bool,
    pub max_image_bytes: u64,
}

#[derive(Template)]
#[template(path = "components/visibility.html")]
pub struct VisibilityTemplate {
    pub post_id: String,
    pub is_hidden: bool,
}

// --- Forms ---

/// A cover image pulled out of a multipart form.
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Default)]
pub struct PostSubmission {
    pub title: String,
    pub content: String,
    pub image: Option<ImageUpload>,
}

#[derive(Serialize)]
pub struct ViewCount {
    pub views: i64,
}

#[derive(Serialize)]
pub struct ViewRecorded {
    pub recorded: bool,
    pub views: i64,
}

// --- Router ---

/// Room for the title and content alongside the largest accepted image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(max_image_bytes: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_image_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/{id}", get(show_post).delete(delete_post))
        .route("/posts/{id}/edit", get(edit_page).post(update_post))
        .route("/posts/{id}/visibility", post(toggle_visibility))
        .route("/posts/{id}/views", get(view_count).post(record_view))
        .layer(DefaultBodyLimit::max(body_limit))
}

// --- Handlers ---

async fn show_post(
    State(state): State<AppState>,
    user: MaybeUser,
    visitor: VisitorId,
    Path(id): Path<String>,
) -> AppResult<Html<PostTemplate>> {
    let viewer = user.viewer();
    let conn = state.db.get()?;

    let post = posts::visible_post(&conn, &id, &viewer)?.ok_or(AppError::NotFound)?;

    match views::record_view(&conn, &post.id, &visitor) {
        Ok(ViewOutcome::Recorded) => tracing::debug!(post_id = %post.id, "View recorded"),
        Ok(ViewOutcome::AlreadyViewed) => {}
        Err(e) => tracing::warn!(post_id = %post.id, "View not recorded: {}", e),
    }

    let views = views::count_views(&conn, &post.id)?;
    let summary = reactions::summarize(&conn, &post.id, viewer.user_id.as_deref())?;
    let comments = blog_comments::list_comments(&conn, &post.id)?
        .iter()
        .map(|c| CommentView::new(c, &viewer))
        .collect();

    let author_name = post.author_display_name().to_string();
    let detail = PostDetail {
        id: post.id.clone(),
        title: post.title.clone(),
        paragraphs: text::paragraphs(&post.content)
            .into_iter()
            .map(str::to_string)
            .collect(),
        image_url: post.image_url.clone(),
        author_id: post.author_id.clone(),
        author_initials: text::initials(&author_name),
        author_name,
        published: text::parse_and_format_time(&post.created_at),
        is_hidden: post.is_hidden,
        can_manage: viewer.can_manage(post.author_id.as_deref()),
    };

    Ok(Html(PostTemplate {
        nav: Nav::new(&user, &state),
        bar: ReactionBar::new(&post.id, summary, viewer.is_signed_in()),
        post: detail,
        views,
        comments,
        comment_name: user.0.map(|u| u.full_name).unwrap_or_default(),
    }))
}

async fn create_post(
    State(state): State<AppState>,
    user: MaybeUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let user = user.require("Sign in to write a post")?;
    let submission = read_submission(multipart, state.config.storage.max_image_bytes).await?;

    let draft = PostDraft::new(&submission.title, &submission.content)?;
    let image_url = match submission.image {
        Some(image) => Some(upload_image(&state, image).await?),
        None => None,
    };

    let id = {
        let conn = state.db.get()?;
        posts::insert_post(&conn, &user.id, &draft, image_url.as_deref())?
    };
    tracing::info!(post_id = %id, author = %user.id, "Post created");

    Ok((
        StatusCode::CREATED,
        [("HX-Redirect", format!("/posts/{}", id))],
        toast("Post published"),
        "",
    )
        .into_response())
}

async fn edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Html<EditPostTemplate>> {
    let post = {
        let conn = state.db.get()?;
        manageable_post(&conn, &id, &user)?
    };

    Ok(Html(EditPostTemplate {
        nav: Nav::new(&MaybeUser(Some(user)), &state),
        post,
        uploads_enabled: state.uploader.is_some(),
        max_image_bytes: state.config.storage.max_image_bytes,
    }))
}

async fn update_post(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Response> {
    let user = user.require("Sign in to edit posts")?;
    let existing = {
        let conn = state.db.get()?;
        manageable_post(&conn, &id, &user)?
    };

    let submission = read_submission(multipart, state.config.storage.max_image_bytes).await?;
    let draft = PostDraft::new(&submission.title, &submission.content)?;
    let image_url = match submission.image {
        Some(image) => Some(upload_image(&state, image).await?),
        None => existing.image_url,
    };

    {
        let conn = state.db.get()?;
        if !posts::update_post(&conn, &id, &draft, image_url.as_deref())? {
            return Err(AppError::NotFound);
        }
    }
    tracing::info!(post_id = %id, editor = %user.id, "Post updated");

    Ok((
        [("HX-Redirect", format!("/posts/{}", id))],
        toast("Post updated"),
        "",
    )
        .into_response())
}

async fn toggle_visibility(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let user = user.require("Sign in to manage posts")?;
    let conn = state.db.get()?;
    manageable_post(&conn, &id, &user)?;

    let is_hidden = posts::toggle_hidden(&conn, &id)?.ok_or(AppError::NotFound)?;
    let message = if is_hidden {
        "Post hidden from readers"
    } else {
        "Post visible to readers"
    };

    Ok((
        toast(message),
        Html(VisibilityTemplate {
            post_id: id,
            is_hidden,
        }),
    )
        .into_response())
}

async fn delete_post(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let user = user.require("Sign in to manage posts")?;
    let conn = state.db.get()?;
    manageable_post(&conn, &id, &user)?;

    posts::delete_post(&conn, &id)?;
    tracing::info!(post_id = %id, by = %user.id, "Post deleted");

    Ok(([("HX-Redirect", "/")], toast("Post deleted"), "").into_response())
}

async fn record_view(
    State(state): State<AppState>,
    user: MaybeUser,
    visitor: VisitorId,
    Path(id): Path<String>,
) -> AppResult<Json<ViewRecorded>> {
    let conn = state.db.get()?;
    if posts::visible_post(&conn, &id, &user.viewer())?.is_none() {
        return Err(AppError::NotFound);
    }
    let outcome = views::record_view(&conn, &id, &visitor)?;
    Ok(Json(ViewRecorded {
        recorded: outcome == ViewOutcome::Recorded,
        views: views::count_views(&conn, &id)?,
    }))
}

async fn view_count(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Json<ViewCount>> {
    let conn = state.db.get()?;
    if posts::visible_post(&conn, &id, &user.viewer())?.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(Json(ViewCount {
        views: views::count_views(&conn, &id)?,
    }))
}

// --- Helpers ---

/// The post, if `user` is its author or an admin.
fn manageable_post(conn: &Connection, id: &str, user: &CurrentUser) -> AppResult<Post> {
    let post = posts::get_post(conn, id)?.ok_or(AppError::NotFound)?;
    if !user.viewer().can_manage(post.author_id.as_deref()) {
        return Err(AppError::Forbidden);
    }
    Ok(post)
}

async fn read_submission(mut multipart: Multipart, limit_bytes: u64) -> AppResult<PostSubmission> {
    let broken = |e| AppError::multipart(e, limit_bytes);
    let mut submission = PostSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(broken)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => submission.title = field.text().await.map_err(broken)?,
            "content" => submission.content = field.text().await.map_err(broken)?,
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(broken)?;
                // An empty file input still sends a part
                if !data.is_empty() {
                    submission.image = Some(ImageUpload {
                        file_name,
                        content_type,
                        data,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(submission)
}

async fn upload_image(state: &AppState, image: ImageUpload) -> AppResult<String> {
    uploads::validate_image(
        image.data.len(),
        &image.content_type,
        state.config.storage.max_image_bytes,
    )?;

    let uploader = state
        .uploader
        .as_ref()
        .ok_or(AppError::NotConfigured("Image upload"))?;

    Ok(uploader
        .upload(&image.file_name, &image.content_type, image.data)
        .await?)
}
