use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Router};
use serde::Deserialize;

use crate::blog::posts;
use crate::blog::reactions::{self, ReactionKind, ReactionSummary};
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::routes::home::Html;
use crate::routes::toast;
use crate::state::AppState;

/// One button in the picker.
pub struct ReactionOption {
    pub kind: &'static str,
    pub emoji: &'static str,
    pub label: &'static str,
    pub count: i64,
    pub selected: bool,
}

pub struct ReactionBar {
    pub post_id: String,
    pub options: Vec<ReactionOption>,
    pub preview: Vec<&'static str>,
    pub total: i64,
    pub mine: Option<&'static str>,
    pub signed_in: bool,
}

impl ReactionBar {
    pub fn new(post_id: &str, summary: ReactionSummary, signed_in: bool) -> Self {
        let options = ReactionKind::ALL
            .into_iter()
            .map(|kind| ReactionOption {
                kind: kind.as_str(),
                emoji: kind.emoji(),
                label: kind.label(),
                count: summary
                    .counts
                    .iter()
                    .find(|c| c.kind == kind)
                    .map(|c| c.count)
                    .unwrap_or(0),
                selected: summary.mine == Some(kind),
            })
            .collect();

        Self {
            post_id: post_id.to_string(),
            options,
            preview: summary.preview().into_iter().map(|k| k.emoji()).collect(),
            total: summary.total,
            mine: summary.mine.map(|k| k.label()),
            signed_in,
        }
    }
}

#[derive(Template)]
#[template(path = "components/reaction_bar.html")]
pub struct ReactionBarTemplate {
    pub bar: ReactionBar,
}

#[derive(Deserialize)]
pub struct ReactionForm {
    pub kind: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/posts/{id}/reactions", post(toggle_reaction))
}

async fn toggle_reaction(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(post_id): Path<String>,
    Form(form): Form<ReactionForm>,
) -> AppResult<Response> {
    let user = user.require("Sign in to react")?;
    let kind: ReactionKind = form
        .kind
        .parse()
        .map_err(|e: reactions::UnknownReaction| AppError::BadRequest(e.to_string()))?;

    let mut conn = state.db.get()?;
    if posts::visible_post(&conn, &post_id, &user.viewer())?.is_none() {
        return Err(AppError::NotFound);
    }

    let transition = reactions::toggle_reaction(&mut conn, &post_id, &user.id, kind)?;
    tracing::debug!(post_id = %post_id, user = %user.id, ?transition, "Reaction toggled");

    let summary = reactions::summarize(&conn, &post_id, Some(&user.id))?;

    Ok((
        toast(transition.message()),
        Html(ReactionBarTemplate {
            bar: ReactionBar::new(&post_id, summary, true),
        }),
    )
        .into_response())
}
