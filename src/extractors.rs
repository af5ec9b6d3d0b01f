use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::session::{self, SessionUser};
use crate::blog::Viewer;
use crate::error::AppError;
use crate::state::AppState;

/// Represents the currently signed-in user.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub full_name: String,
    pub is_admin: bool,
}

impl CurrentUser {
    pub fn viewer(&self) -> Viewer {
        Viewer::user(self.id.clone(), self.is_admin)
    }
}

impl From<SessionUser> for CurrentUser {
    fn from(user: SessionUser) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            is_admin: user.is_admin,
        }
    }
}

/// Extractor that requires a session.
/// Returns 401 if no valid session found.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = crate::auth::session_token(&parts.headers).ok_or(AppError::Unauthorized)?;

        let conn = state.db.get()?;
        session::lookup_session(&conn, token)?
            .map(CurrentUser::from)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional user extractor: `None` instead of 401 when not signed in.
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn viewer(&self) -> Viewer {
        self.0
            .as_ref()
            .map(CurrentUser::viewer)
            .unwrap_or_default()
    }

    /// The user, or a 401 carrying `message` for the visitor.
    pub fn require(self, message: &'static str) -> Result<CurrentUser, AppError> {
        self.0.ok_or(AppError::SignInRequired(message))
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::Unauthorized) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}
