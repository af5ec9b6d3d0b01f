pub mod assets;
pub mod auth;
pub mod authors;
pub mod comments;
pub mod graphql;
pub mod home;
pub mod posts;
pub mod reactions;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::blog::text;
use crate::blog::Viewer;
use crate::db::models::Post;
use crate::extractors::MaybeUser;
use crate::state::AppState;
use crate::visitor;

/// The full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .merge(posts::router(state.config.storage.max_image_bytes))
        .merge(reactions::router())
        .merge(comments::router())
        .merge(authors::router())
        .merge(auth::router())
        .merge(graphql::router())
        .fallback(home::not_found)
        .layer(middleware::from_fn(visitor::track_visitor))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `HX-Trigger` header that pops a toast in the browser.
pub fn toast(message: &str) -> [(&'static str, String); 1] {
    [(
        "HX-Trigger",
        serde_json::json!({ "toast": message }).to_string(),
    )]
}

/// Header bar state shared by every page.
pub struct Nav {
    pub user_name: Option<String>,
    pub is_admin: bool,
    pub sign_in_enabled: bool,
}

impl Nav {
    pub fn new(user: &MaybeUser, state: &AppState) -> Self {
        Self {
            user_name: user.0.as_ref().map(|u| u.full_name.clone()),
            is_admin: user.0.as_ref().map(|u| u.is_admin).unwrap_or(false),
            sign_in_enabled: state.verifier.is_some(),
        }
    }
}

/// A post as shown in lists and the carousel.
pub struct PostCard {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub image_url: Option<String>,
    pub author_id: Option<String>,
    pub author_name: String,
    pub author_initials: String,
    pub published: String,
    pub is_hidden: bool,
    pub can_manage: bool,
}

impl PostCard {
    pub fn new(post: &Post, viewer: &Viewer) -> Self {
        let author_name = post.author_display_name().to_string();
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            excerpt: text::excerpt(&post.content),
            image_url: post.image_url.clone(),
            author_id: post.author_id.clone(),
            author_initials: text::initials(&author_name),
            author_name,
            published: text::parse_and_format_time(&post.created_at),
            is_hidden: post.is_hidden,
            can_manage: viewer.can_manage(post.author_id.as_deref()),
        }
    }

    pub fn list(posts: &[Post], viewer: &Viewer) -> Vec<Self> {
        posts.iter().map(|p| Self::new(p, viewer)).collect()
    }
}
