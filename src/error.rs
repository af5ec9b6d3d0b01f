use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::auth::provider::TokenError;
use crate::blog::views::ViewError;
use crate::uploads::UploadError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    /// The action needs a signed-in user; the message is shown to the visitor.
    #[error("{0}")]
    SignInRequired(&'static str),

    #[error("Forbidden")]
    Forbidden,

    #[error("Missing fields: {0}")]
    MissingFields(&'static str),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("File too large")]
    FileTooLarge { limit_bytes: u64 },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Invalid identity token: {0}")]
    Token(#[from] TokenError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ViewError> for AppError {
    fn from(err: ViewError) -> Self {
        match err {
            ViewError::UnknownPost => AppError::NotFound,
            ViewError::Database(e) => AppError::Database(e),
        }
    }
}

impl AppError {
    /// A broken multipart body; an over-limit body reports the configured image limit.
    pub fn multipart(err: axum::extract::multipart::MultipartError, limit_bytes: u64) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::FileTooLarge { limit_bytes }
        } else {
            AppError::BadRequest(err.body_text())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::SignInRequired(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "You are not allowed to do that".to_string(),
            ),
            AppError::MissingFields(msg) => {
                (StatusCode::BAD_REQUEST, format!("Missing fields: {}", msg))
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::FileTooLarge { limit_bytes } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "File too large: please compress your image to under {}KB",
                    limit_bytes / 1024
                ),
            ),
            AppError::NotConfigured(feature) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("{} is not configured on this server", feature),
            ),
            AppError::Upload(e) => {
                tracing::error!("Upload error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to upload image. Please try again.".to_string(),
                )
            }
            AppError::Token(e) => {
                tracing::warn!("Rejected identity token: {}", e);
                (StatusCode::UNAUTHORIZED, "Invalid sign-in token".to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn response_status(err: AppError) -> StatusCode {
        let response = err.into_response();
        response.status()
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(response_status(AppError::NotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn sign_in_required_returns_401() {
        assert_eq!(
            response_status(AppError::SignInRequired("Sign in to react")),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn forbidden_returns_403() {
        assert_eq!(response_status(AppError::Forbidden), StatusCode::FORBIDDEN);
    }

    #[test]
    fn missing_fields_returns_400() {
        assert_eq!(
            response_status(AppError::MissingFields("title")),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn file_too_large_returns_413() {
        assert_eq!(
            response_status(AppError::FileTooLarge { limit_bytes: 1024 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn not_configured_returns_503() {
        assert_eq!(
            response_status(AppError::NotConfigured("Sign-in")),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn unknown_post_view_maps_to_404() {
        let err: AppError = ViewError::UnknownPost.into();
        assert_eq!(response_status(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_returns_500() {
        assert_eq!(
            response_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
