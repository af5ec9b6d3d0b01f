use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

/// Largest accepted cover image, in bytes.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 470 * 1024;

#[derive(Parser, Debug)]
#[command(name = "gazette", about = "A small multi-author blog server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the web server (default)
    Serve,
    /// Grant the admin role to a user id
    GrantAdmin { user_id: String },
    /// Remove the admin role from a user id
    RevokeAdmin { user_id: String },
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub session_hours: u64,
    /// Hex-encoded Ed25519 public key of the identity provider
    pub provider_public_key: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Public base URL that uploaded object keys are appended to
    pub public_url: Option<String>,
    /// Endpoint of the function that hands out pre-signed upload URLs
    pub signer_url: Option<String>,
    /// Bearer key sent to the signer, if it requires one
    pub signer_key: Option<String>,
    pub max_image_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_hours: 720,
            provider_public_key: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_url: None,
            signer_url: None,
            signer_key: None,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        Self::load_with_env(cli, |key| std::env::var(key).ok())
    }

    /// Layering: file, then environment, then CLI flags.
    pub fn load_with_env<F>(cli: &Cli, env: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env(env);

        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("gazette.db"));
        }

        Ok(config)
    }

    fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GAZETTE_AUTH_PUBLIC_KEY") {
            self.auth.provider_public_key = Some(key);
        }
        if let Some(url) = non_empty("GAZETTE_STORAGE_PUBLIC_URL") {
            self.storage.public_url = Some(url);
        }
        if let Some(url) = non_empty("GAZETTE_UPLOAD_SIGNER_URL") {
            self.storage.signer_url = Some(url);
        }
        if let Some(key) = non_empty("GAZETTE_UPLOAD_SIGNER_KEY") {
            self.storage.signer_key = Some(key);
        }
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".gazette")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("gazette.db"))
    }

    pub fn auth_enabled(&self) -> bool {
        self.auth.provider_public_key.is_some()
    }

    pub fn uploads_enabled(&self) -> bool {
        self.storage.public_url.is_some() && self.storage.signer_url.is_some()
    }

    /// Log every optional feature that is switched off by missing settings.
    pub fn warn_disabled_features(&self) {
        if !self.auth_enabled() {
            tracing::warn!(
                "No identity provider key configured (GAZETTE_AUTH_PUBLIC_KEY); sign-in is disabled"
            );
        }
        if self.storage.public_url.is_none() {
            tracing::warn!(
                "No storage public URL configured (GAZETTE_STORAGE_PUBLIC_URL); image uploads are disabled"
            );
        }
        if self.storage.signer_url.is_none() {
            tracing::warn!(
                "No upload signer configured (GAZETTE_UPLOAD_SIGNER_URL); image uploads are disabled"
            );
        }
    }
}
