use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::provider::TokenVerifier;
use crate::config::Config;
use crate::graphql::BlogSchema;
use crate::uploads::ImageUploader;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    /// `None` when no identity provider key is configured.
    pub verifier: Option<Arc<TokenVerifier>>,
    /// `None` when storage settings are missing.
    pub uploader: Option<Arc<ImageUploader>>,
    pub graphql_schema: BlogSchema,
}

impl AppState {
    /// Build state from config, switching off features whose settings are absent.
    pub fn from_config(db: DbPool, config: Config) -> anyhow::Result<Self> {
        let verifier = match config.auth.provider_public_key.as_deref() {
            Some(key) => Some(Arc::new(TokenVerifier::from_hex(key)?)),
            None => None,
        };

        let uploader = match (
            config.storage.signer_url.as_deref(),
            config.storage.public_url.as_deref(),
        ) {
            (Some(signer_url), Some(public_url)) => Some(Arc::new(ImageUploader::over_http(
                signer_url,
                config.storage.signer_key.clone(),
                public_url,
            )?)),
            _ => None,
        };

        Ok(Self {
            db,
            config,
            verifier,
            uploader,
            graphql_schema: crate::graphql::build_schema(),
        })
    }
}
