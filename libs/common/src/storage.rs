//! Object storage module for the Honey store
//!
//! Product images live in Supabase Storage. This module talks to the storage
//! REST API with the service role key: uploading objects, building their
//! public URLs and minting time-limited signed URLs. The [`ObjectStorage`]
//! trait is the seam the API service depends on.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::{StorageError, StorageResult};

/// Path segment separating the project URL from a public object reference
pub const PUBLIC_OBJECT_MARKER: &str = "/storage/v1/object/public/";

/// Configuration for the storage client
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Project URL (e.g., "https://abc.supabase.co")
    pub project_url: String,
    /// Service role key used for both `apikey` and bearer auth
    pub service_role_key: String,
}

/// A public storage URL split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    /// Path of the object inside the bucket
    pub path: String,
    pub folder: String,
    pub file_name: String,
}

/// Parse a public object URL into bucket and path
///
/// `https://x.supabase.co/storage/v1/object/public/My%20Bucket/products/a.jpg`
/// yields bucket `My Bucket` and path `products/a.jpg`. Both are returned
/// percent-decoded.
pub fn parse_public_url(url: &str) -> StorageResult<ObjectLocation> {
    let (_, rest) = url
        .split_once(PUBLIC_OBJECT_MARKER)
        .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))?;

    let (bucket_encoded, path_encoded) = rest.split_once('/').unwrap_or((rest, ""));
    let decode = |part: &str| {
        urlencoding::decode(part)
            .map(|cow| cow.into_owned())
            .map_err(|_| StorageError::InvalidUrl(url.to_string()))
    };
    let bucket = decode(bucket_encoded)?;
    let path = decode(path_encoded)?;

    let (folder, file_name) = match path.rsplit_once('/') {
        Some((folder, file_name)) => (folder.to_string(), file_name.to_string()),
        None => (String::new(), path.clone()),
    };

    Ok(ObjectLocation {
        bucket,
        path,
        folder,
        file_name,
    })
}

/// Encode each segment of an object path, keeping the separators
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Operations the API needs from an object store
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload bytes under `path`, failing if the object already exists
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Public URL for an object; no request is made
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Signed URL granting read access for `expires_in` seconds
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: u64,
    ) -> StorageResult<String>;
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

#[derive(Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Supabase Storage REST client
#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    config: StorageConfig,
}

impl SupabaseStorage {
    /// Create a new storage client
    pub fn new(config: StorageConfig) -> Self {
        info!("Storage client initialized for {}", config.project_url);
        Self {
            client: Client::new(),
            config,
        }
    }

    fn storage_root(&self) -> String {
        format!(
            "{}/storage/v1",
            self.config.project_url.trim_end_matches('/')
        )
    }

    fn object_endpoint(&self, kind: &str, bucket: &str, path: &str) -> String {
        format!(
            "{}/object/{}{}/{}",
            self.storage_root(),
            kind,
            urlencoding::encode(bucket),
            encode_path(path)
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.config.service_role_key)
            .header("apikey", &self.config.service_role_key)
    }

    async fn provider_error(response: reqwest::Response) -> StorageError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ProviderError>(&body)
            .ok()
            .and_then(|e| e.message.or(e.error))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });

        StorageError::Provider {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        info!(
            "Uploading object {}/{} ({} bytes, {})",
            bucket,
            path,
            bytes.len(),
            content_type
        );

        let response = self
            .authorized(self.client.post(self.object_endpoint("", bucket, path)))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::provider_error(response).await;
            error!("Storage upload failed for {}/{}: {}", bucket, path, err);
            return Err(err);
        }

        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.object_endpoint("public/", bucket, path)
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: u64,
    ) -> StorageResult<String> {
        let response = self
            .authorized(self.client.post(self.object_endpoint("sign/", bucket, path)))
            .json(&json!({ "expiresIn": expires_in }))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Self::provider_error(response).await);
        }

        let signed: SignedUrlResponse = response.json().await?;
        Ok(format!("{}{}", self.storage_root(), signed.signed_url))
    }
}
