use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::blog::posts;
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::routes::{Nav, PostCard};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
    pub query: String,
    pub featured: Vec<PostCard>,
    pub posts: Vec<PostCard>,
    pub can_write: bool,
    pub uploads_enabled: bool,
    pub max_image_bytes: u64,
}

#[derive(Template)]
#[template(path = "pages/not_found.html")]
pub struct NotFoundTemplate {
    pub nav: Nav,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

#[derive(Deserialize, Default)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

pub async fn index(
    State(state): State<AppState>,
    user: MaybeUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Html<IndexTemplate>> {
    let viewer = user.viewer();
    let query = params.q.trim().to_string();

    let all = {
        let conn = state.db.get()?;
        posts::list_posts(&conn, &viewer, Some(&query))?
    };

    // The carousel only shows on the unfiltered front page
    let featured = if query.is_empty() {
        PostCard::list(posts::featured(&all), &viewer)
    } else {
        Vec::new()
    };

    Ok(Html(IndexTemplate {
        nav: Nav::new(&user, &state),
        featured,
        posts: PostCard::list(&all, &viewer),
        query,
        can_write: viewer.is_signed_in(),
        uploads_enabled: state.uploader.is_some(),
        max_image_bytes: state.config.storage.max_image_bytes,
    }))
}

pub async fn not_found(State(state): State<AppState>, user: MaybeUser) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(NotFoundTemplate {
            nav: Nav::new(&user, &state),
        }),
    )
        .into_response()
}
