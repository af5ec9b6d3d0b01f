//! Blog domain: posts, comments, reactions, views, profiles.
//!
//! Functions here take a plain `rusqlite::Connection` so handlers, GraphQL
//! resolvers and CLI commands share one set of queries.

pub mod archive;
pub mod comments;
pub mod posts;
pub mod profiles;
pub mod reactions;
pub mod text;
pub mod views;

use crate::error::AppError;

/// Who is looking. Drives hidden-post visibility and manage rights.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<String>,
    pub is_admin: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: impl Into<String>, is_admin: bool) -> Self {
        Self {
            user_id: Some(user_id.into()),
            is_admin,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some()
    }

    /// Admins manage everything; authors manage their own content.
    pub fn can_manage(&self, author_id: Option<&str>) -> bool {
        if self.is_admin {
            return true;
        }
        match (self.user_id.as_deref(), author_id) {
            (Some(me), Some(author)) => me == author,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in both title and content.")]
    MissingPostFields,

    #[error("Please fill in your name and comment.")]
    MissingCommentFields,

    #[error("Name must be {0} characters or less")]
    NameTooLong(usize),

    #[error("Comment must be {0} characters or less")]
    CommentTooLong(usize),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingPostFields => {
                AppError::MissingFields("Please fill in both title and content.")
            }
            ValidationError::MissingCommentFields => {
                AppError::MissingFields("Please fill in your name and comment.")
            }
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_manages_nothing() {
        let viewer = Viewer::anonymous();
        assert!(!viewer.can_manage(Some("u1")));
        assert!(!viewer.can_manage(None));
    }

    #[test]
    fn author_manages_own_content_only() {
        let viewer = Viewer::user("u1", false);
        assert!(viewer.can_manage(Some("u1")));
        assert!(!viewer.can_manage(Some("u2")));
        assert!(!viewer.can_manage(None));
    }

    #[test]
    fn admin_manages_everything() {
        let viewer = Viewer::user("root", true);
        assert!(viewer.can_manage(Some("u2")));
        assert!(viewer.can_manage(None));
    }
}
