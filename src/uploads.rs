//! Cover image uploads through a pre-signed URL.
//!
//! The flow is: ask the signer for a URL, `PUT` the bytes there, then point
//! the post at `{public_url}/{file_name}`. Nothing is retried or cleaned up.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid upload endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("signer request failed: {0}")]
    Signer(String),

    #[error("storage rejected upload with status {0}")]
    Storage(reqwest::StatusCode),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Reject an image before any network call.
pub fn validate_image(size: usize, content_type: &str, limit_bytes: u64) -> Result<(), AppError> {
    if size as u64 > limit_bytes {
        return Err(AppError::FileTooLarge { limit_bytes });
    }
    if !content_type.starts_with("image/") {
        return Err(AppError::BadRequest(
            "Only image files can be uploaded".into(),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest<'a> {
    pub file_name: &'a str,
    pub file_type: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    pub signed_url: String,
    pub file_name: String,
}

/// Hands out a pre-signed URL for one object.
#[async_trait]
pub trait UploadSigner: Send + Sync {
    async fn sign(&self, file_name: &str, file_type: &str) -> Result<SignedUpload, UploadError>;
}

pub struct HttpUploadSigner {
    http: reqwest::Client,
    endpoint: url::Url,
    bearer: Option<String>,
}

impl HttpUploadSigner {
    pub fn new(http: reqwest::Client, endpoint: &str, bearer: Option<String>) -> Result<Self, UploadError> {
        Ok(Self {
            http,
            endpoint: url::Url::parse(endpoint)?,
            bearer,
        })
    }
}

#[async_trait]
impl UploadSigner for HttpUploadSigner {
    async fn sign(&self, file_name: &str, file_type: &str) -> Result<SignedUpload, UploadError> {
        let mut request = self
            .http
            .post(self.endpoint.clone())
            .json(&SignRequest { file_name, file_type });
        if let Some(key) = &self.bearer {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Signer(format!("{}: {}", status, body)));
        }

        Ok(response.json::<SignedUpload>().await?)
    }
}

pub struct ImageUploader {
    signer: Box<dyn UploadSigner>,
    http: reqwest::Client,
    public_base: String,
}

impl ImageUploader {
    pub fn new(signer: Box<dyn UploadSigner>, http: reqwest::Client, public_base: &str) -> Result<Self, UploadError> {
        url::Url::parse(public_base)?;
        Ok(Self {
            signer,
            http,
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn over_http(
        signer_url: &str,
        signer_key: Option<String>,
        public_base: &str,
    ) -> Result<Self, UploadError> {
        let http = reqwest::Client::new();
        let signer = HttpUploadSigner::new(http.clone(), signer_url, signer_key)?;
        Self::new(Box::new(signer), http, public_base)
    }

    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.public_base, file_name)
    }

    /// Upload `data` and return the URL it will be served from.
    pub async fn upload(
        &self,
        original_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, UploadError> {
        let key = object_key(original_name, content_type);
        let signed = self.signer.sign(&key, content_type).await?;

        let size = data.len();
        let response = self
            .http
            .put(&signed.signed_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(UploadError::Storage(response.status()));
        }

        tracing::info!(file = %signed.file_name, size, "Uploaded image");
        Ok(self.public_url(&signed.file_name))
    }
}

/// A fresh object key keeping the original extension when there is one.
fn object_key(original_name: &str, content_type: &str) -> String {
    let ext = std::path::Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(content_type)
                .and_then(|exts| exts.first())
                .map(|e| e.to_string())
        });

    let id = uuid::Uuid::now_v7();
    match ext {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSigner;

    #[async_trait]
    impl UploadSigner for FixedSigner {
        async fn sign(&self, file_name: &str, _file_type: &str) -> Result<SignedUpload, UploadError> {
            Ok(SignedUpload {
                signed_url: format!("http://127.0.0.1:9/{}", file_name),
                file_name: file_name.to_string(),
            })
        }
    }

    #[test]
    fn oversized_image_is_rejected() {
        let limit = 470 * 1024;
        assert!(validate_image(limit as usize, "image/png", limit).is_ok());
        assert!(matches!(
            validate_image(limit as usize + 1, "image/png", limit),
            Err(AppError::FileTooLarge { limit_bytes }) if limit_bytes == limit
        ));
    }

    #[test]
    fn non_image_is_rejected() {
        assert!(matches!(
            validate_image(10, "application/pdf", 1024),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn public_url_strips_trailing_slash() {
        let uploader =
            ImageUploader::new(Box::new(FixedSigner), reqwest::Client::new(), "https://cdn.example.com/blog/")
                .unwrap();
        assert_eq!(
            uploader.public_url("a.png"),
            "https://cdn.example.com/blog/a.png"
        );
    }

    #[test]
    fn invalid_public_base_is_rejected() {
        assert!(ImageUploader::new(Box::new(FixedSigner), reqwest::Client::new(), "not a url").is_err());
    }

    #[test]
    fn object_key_keeps_extension() {
        assert!(object_key("Photo.JPG", "image/jpeg").ends_with(".jpg"));
        let from_mime = object_key("blob", "image/png");
        assert!(from_mime.contains('.'));
        assert_ne!(object_key("a.png", "image/png"), object_key("a.png", "image/png"));
    }
}
