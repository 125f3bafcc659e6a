//! Configuration for the API service
//!
//! Values are layered: built-in defaults, then an optional `config/api.toml`,
//! then environment variables (`DATABASE_URL`, `SUPABASE_URL`, `JWT_SECRET`,
//! ...). A `.env` file is loaded into the environment first when present.

use anyhow::{Result, bail};
use config::{Config, Environment, File};
use honey_common::{database::DatabaseConfig, storage::StorageConfig};
use serde::Deserialize;

use crate::services::ImageSettings;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    pub database_url: String,
    pub database_max_connections: u32,
    pub database_min_connections: u32,
    /// Connection timeout in seconds
    pub database_connection_timeout: u64,
    /// Apply the bundled schema migrations on startup
    pub run_migrations: bool,

    pub supabase_url: String,
    pub supabase_service_role_key: String,

    /// Shared secret the auth provider signs access tokens with
    pub jwt_secret: String,
    /// Expected `aud` claim; empty disables the audience check
    pub jwt_audience: String,

    pub storage_bucket: String,
    /// Folder inside the bucket new product images are written to
    pub storage_folder: String,
    /// Signed URL lifetime in seconds
    pub signed_url_ttl: u64,
    /// Per-file upload limit in bytes
    pub max_file_size: usize,
    /// Maximum number of image files accepted in one request
    pub max_files: usize,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::info!("Loaded environment from {}", path.display());
        }

        Self::from_env(Environment::default())
    }

    /// Build the configuration from the given environment source
    pub fn from_env(env: Environment) -> Result<Self> {
        let config = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("database_max_connections", 10)?
            .set_default("database_min_connections", 1)?
            .set_default("database_connection_timeout", 30)?
            .set_default("run_migrations", false)?
            .set_default("jwt_audience", "authenticated")?
            .set_default("storage_bucket", "honeybee")?
            .set_default("storage_folder", "products")?
            .set_default("signed_url_ttl", 3600)?
            .set_default("max_file_size", 10 * 1024 * 1024)?
            .set_default("max_files", 10)?
            .add_source(File::with_name("config/api").required(false))
            .add_source(env.try_parsing(true))
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("DATABASE_URL", &self.database_url),
            ("SUPABASE_URL", &self.supabase_url),
            ("SUPABASE_SERVICE_ROLE_KEY", &self.supabase_service_role_key),
            ("JWT_SECRET", &self.jwt_secret),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                bail!("{} must not be empty", key);
            }
        }

        if self.max_file_size == 0 || self.max_files == 0 {
            bail!("MAX_FILE_SIZE and MAX_FILES must be positive");
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            database_url: self.database_url.clone(),
            max_connections: self.database_max_connections,
            min_connections: self.database_min_connections,
            connection_timeout: self.database_connection_timeout,
        }
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig {
            project_url: self.supabase_url.clone(),
            service_role_key: self.supabase_service_role_key.clone(),
        }
    }

    pub fn images(&self) -> ImageSettings {
        ImageSettings {
            bucket: self.storage_bucket.clone(),
            folder: self.storage_folder.clone(),
            signed_url_ttl: self.signed_url_ttl,
            max_file_size: self.max_file_size,
            max_files: self.max_files,
        }
    }
}
