use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::{clear_session_cookie, session, session_cookie, session_token};
use crate::blog::profiles;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignInRequest {
    /// Token issued by the identity provider
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignInResponse {
    pub user_id: String,
    pub name: String,
    pub is_admin: bool,
}

/// POST /auth/session - exchange an identity token for a session cookie
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> AppResult<Response> {
    let verifier = state
        .verifier
        .as_ref()
        .ok_or(AppError::NotConfigured("Sign-in"))?;

    let claims = verifier.verify(req.token.trim())?;
    let name = claims.display_name();

    let (token, is_admin) = {
        let conn = state.db.get()?;
        profiles::upsert_profile(&conn, &claims.sub, &name)?;
        let token = session::create_session(&conn, &claims.sub, state.config.auth.session_hours)?;
        (token, profiles::is_admin(&conn, &claims.sub)?)
    };

    tracing::info!(user_id = %claims.sub, "Signed in");

    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            session_cookie(&token, state.config.auth.session_hours),
        )]),
        Json(SignInResponse {
            user_id: claims.sub,
            name,
            is_admin,
        }),
    )
        .into_response())
}

/// POST /auth/logout - end the session and clear the cookie
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = session_token(&headers) {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
    }

    Ok((
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie())]),
        [("HX-Redirect", "/")],
        "",
    )
        .into_response())
}
