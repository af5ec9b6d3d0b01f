use askama::Template;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;

use crate::blog::archive::{self, ArchiveMonth};
use crate::blog::{posts, profiles, text, Viewer};
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::routes::home::Html;
use crate::routes::{Nav, PostCard};
use crate::state::AppState;

pub struct AuthorView {
    pub user_id: String,
    pub full_name: String,
    pub initials: String,
    pub post_count: i64,
}

#[derive(Template)]
#[template(path = "pages/archive.html")]
pub struct ArchiveTemplate {
    pub nav: Nav,
    pub months: Vec<ArchiveMonth>,
}

#[derive(Template)]
#[template(path = "pages/authors.html")]
pub struct AuthorsTemplate {
    pub nav: Nav,
    pub authors: Vec<AuthorView>,
}

#[derive(Template)]
#[template(path = "pages/author.html")]
pub struct AuthorTemplate {
    pub nav: Nav,
    pub author: AuthorView,
    pub posts: Vec<PostCard>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/archive", get(archive_page))
        .route("/authors", get(authors_page))
        .route("/authors/{id}", get(author_page))
}

async fn archive_page(
    State(state): State<AppState>,
    user: MaybeUser,
) -> AppResult<Html<ArchiveTemplate>> {
    // Hidden posts stay out of the archive, even for their authors
    let visible = {
        let conn = state.db.get()?;
        posts::list_posts(&conn, &Viewer::anonymous(), None)?
    };

    Ok(Html(ArchiveTemplate {
        nav: Nav::new(&user, &state),
        months: archive::group_by_month(&visible),
    }))
}

async fn authors_page(
    State(state): State<AppState>,
    user: MaybeUser,
) -> AppResult<Html<AuthorsTemplate>> {
    let authors = {
        let conn = state.db.get()?;
        profiles::list_authors(&conn)?
    };

    Ok(Html(AuthorsTemplate {
        nav: Nav::new(&user, &state),
        authors: authors
            .into_iter()
            .map(|a| AuthorView {
                initials: text::initials(&a.full_name),
                user_id: a.user_id,
                full_name: a.full_name,
                post_count: a.post_count,
            })
            .collect(),
    }))
}

async fn author_page(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Html<AuthorTemplate>> {
    let (profile, authored) = {
        let conn = state.db.get()?;
        let profile = profiles::get_profile(&conn, &id)?.ok_or(AppError::NotFound)?;
        (profile, posts::list_by_author(&conn, &id)?)
    };

    let viewer = user.viewer();
    Ok(Html(AuthorTemplate {
        nav: Nav::new(&user, &state),
        author: AuthorView {
            initials: text::initials(&profile.full_name),
            post_count: authored.len() as i64,
            user_id: profile.user_id,
            full_name: profile.full_name,
        },
        posts: PostCard::list(&authored, &viewer),
    }))
}
