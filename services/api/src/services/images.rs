//! Product image handling
//!
//! Uploads go to object storage under a generated key and the public URL is
//! what gets persisted. Reads turn those public URLs into short-lived signed
//! URLs; an image that cannot be signed is dropped from the response rather
//! than failing it.

use axum::extract::Multipart;
use futures::future::{join_all, try_join_all};
use honey_common::storage::{ObjectStorage, parse_public_url};
use rand::Rng;
use rust_decimal::Decimal;
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{CreateProductRequest, ListedProduct, Product, ProductView},
};

const ALLOWED_MIME_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/svg+xml",
];

const KEY_SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const KEY_SUFFIX_LEN: usize = 10;

/// Body allowance for form fields and part headers
pub const FORM_OVERHEAD: usize = 1024 * 1024;

pub fn is_valid_image_mime(mime: &str) -> bool {
    let mime = mime.trim().to_ascii_lowercase();
    ALLOWED_MIME_TYPES.contains(&mime.as_str())
}

/// File extension for a MIME type, `jpg` when unknown
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        _ => "jpg",
    }
}

/// An image file received from a client
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    fn extension(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.trim())
            .filter(|ext| !ext.is_empty() && !ext.contains('/'))
            .map(str::to_string)
            .unwrap_or_else(|| extension_for_mime(&self.content_type).to_string())
    }
}

/// Storage key for a new upload: `{folder}/{unix_millis}-{random}.{ext}`
pub fn object_key(folder: &str, upload: &ImageUpload) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let mut rng = rand::thread_rng();
    let suffix: String = (0..KEY_SUFFIX_LEN)
        .map(|_| KEY_SUFFIX_CHARSET[rng.gen_range(0..KEY_SUFFIX_CHARSET.len())] as char)
        .collect();

    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("{}-{}.{}", millis, suffix, upload.extension())
    } else {
        format!("{}/{}-{}.{}", folder, millis, suffix, upload.extension())
    }
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub bucket: String,
    pub folder: String,
    /// Signed URL lifetime in seconds
    pub signed_url_ttl: u64,
    pub max_file_size: usize,
    pub max_files: usize,
}

impl ImageSettings {
    /// Largest request body accepted on upload routes
    ///
    /// Leaves room for text fields and multipart framing on top of the
    /// files; the per-file limit is enforced while reading each part.
    pub fn max_body_size(&self) -> usize {
        self.max_file_size
            .saturating_mul(self.max_files)
            .saturating_add(FORM_OVERHEAD)
    }
}

/// Product creation input parsed from a multipart body
#[derive(Debug, Default)]
pub struct ProductForm {
    pub request: CreateProductRequest,
    pub images: Vec<ImageUpload>,
}

/// Image upload and signing on top of an [`ObjectStorage`]
#[derive(Clone)]
pub struct ImageService {
    storage: Arc<dyn ObjectStorage>,
    settings: ImageSettings,
}

impl ImageService {
    pub fn new(storage: Arc<dyn ObjectStorage>, settings: ImageSettings) -> Self {
        Self { storage, settings }
    }

    pub fn settings(&self) -> &ImageSettings {
        &self.settings
    }

    fn check(&self, upload: &ImageUpload) -> ApiResult<()> {
        if !is_valid_image_mime(&upload.content_type) {
            return Err(ApiError::BadRequest(format!(
                "Invalid file type: {}. Only image files are allowed.",
                upload.content_type
            )));
        }
        if upload.bytes.is_empty() {
            return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
        }
        if upload.bytes.len() > self.settings.max_file_size {
            return Err(file_too_large(self.settings.max_file_size));
        }
        Ok(())
    }

    /// Store one image and return its public URL
    pub async fn upload(&self, upload: ImageUpload) -> ApiResult<String> {
        self.check(&upload)?;

        let key = object_key(&self.settings.folder, &upload);
        info!(
            "Uploading image {} ({} bytes, {})",
            key,
            upload.bytes.len(),
            upload.content_type
        );

        let content_type = upload.content_type.trim().to_ascii_lowercase();
        self.storage
            .upload(&self.settings.bucket, &key, upload.bytes, &content_type)
            .await?;

        Ok(self.storage.public_url(&self.settings.bucket, &key))
    }

    /// Validate a batch of files without uploading any of them
    pub fn check_all(&self, uploads: &[ImageUpload]) -> ApiResult<()> {
        uploads.iter().try_for_each(|upload| self.check(upload))
    }

    /// Upload several images concurrently, keeping their order
    ///
    /// Every file is validated before anything is sent to storage.
    pub async fn upload_all(&self, uploads: Vec<ImageUpload>) -> ApiResult<Vec<String>> {
        self.check_all(&uploads)?;
        try_join_all(uploads.into_iter().map(|upload| self.upload(upload))).await
    }

    async fn sign_url(&self, url: &str) -> Option<String> {
        let location = match parse_public_url(url) {
            Ok(location) => location,
            Err(e) => {
                warn!("Skipping image {}: {}", url, e);
                return None;
            }
        };

        match self
            .storage
            .create_signed_url(&location.bucket, &location.path, self.settings.signed_url_ttl)
            .await
        {
            Ok(signed) => Some(signed),
            Err(e) => {
                warn!("Failed to sign image {}: {}", url, e);
                None
            }
        }
    }

    /// Signed URLs for stored public URLs; failures are left out
    pub async fn sign_urls(&self, urls: &[String]) -> Vec<String> {
        join_all(urls.iter().map(|url| self.sign_url(url)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    pub async fn sign_product(&self, product: Product) -> ProductView {
        let image_url = self.sign_urls(&product.image_url).await;
        ProductView::new(product, image_url)
    }

    pub async fn sign_products(&self, products: Vec<Product>) -> Vec<ProductView> {
        join_all(products.into_iter().map(|p| self.sign_product(p))).await
    }

    /// Sign a listed product and attach its display names
    pub async fn sign_listed(&self, listed: ListedProduct) -> ProductView {
        let ListedProduct {
            product,
            seller_name,
            category_name,
        } = listed;
        self.sign_product(product)
            .await
            .with_names(seller_name, category_name)
    }

    pub async fn sign_listed_all(&self, products: Vec<ListedProduct>) -> Vec<ProductView> {
        join_all(products.into_iter().map(|p| self.sign_listed(p))).await
    }

    /// Read a product creation form, buffering `image` file parts
    ///
    /// Files over the per-file limit fail with 413 as soon as the limit is
    /// crossed.
    pub async fn read_product_form(&self, mut multipart: Multipart) -> ApiResult<ProductForm> {
        let mut form = ProductForm::default();

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "image" {
                if form.images.len() >= self.settings.max_files {
                    return Err(ApiError::BadRequest(format!(
                        "Too many files, at most {} allowed",
                        self.settings.max_files
                    )));
                }

                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "image/jpeg".to_string());

                let mut bytes = Vec::new();
                while let Some(chunk) = field.chunk().await? {
                    if bytes.len() + chunk.len() > self.settings.max_file_size {
                        return Err(file_too_large(self.settings.max_file_size));
                    }
                    bytes.extend_from_slice(&chunk);
                }

                form.images.push(ImageUpload {
                    file_name,
                    content_type,
                    bytes,
                });
                continue;
            }

            let value = field.text().await?;
            apply_text_field(&mut form.request, &name, value)?;
        }

        Ok(form)
    }
}

fn file_too_large(limit: usize) -> ApiError {
    ApiError::PayloadTooLarge(format!("File exceeds the {} byte limit", limit))
}

fn blank_to_none(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Copy one multipart text field onto the creation request
fn apply_text_field(
    request: &mut CreateProductRequest,
    name: &str,
    value: String,
) -> ApiResult<()> {
    match name {
        "name" => request.name = Some(value),
        "description" => request.description = Some(value),
        // An unparseable price is treated as missing and rejected by validation
        "price" => request.price = blank_to_none(value).and_then(|v| v.parse::<Decimal>().ok()),
        "stock" => {
            request.stock = blank_to_none(value)
                .map(|v| v.parse::<i32>())
                .transpose()
                .map_err(|_| ApiError::BadRequest("Invalid stock".to_string()))?;
        }
        "image_url" => {
            if let Some(url) = blank_to_none(value) {
                request.image_url.push(url);
            }
        }
        "category_id" => {
            request.category_id = blank_to_none(value)
                .map(|v| v.parse::<Uuid>())
                .transpose()
                .map_err(|_| ApiError::BadRequest("Invalid category_id".to_string()))?;
        }
        "category_name" => request.category_name = blank_to_none(value),
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use honey_common::error::{StorageError, StorageResult};
    use std::sync::Mutex;

    const PROJECT: &str = "https://demo.supabase.co";

    /// In-memory object store; paths containing "missing" cannot be signed
    #[derive(Default)]
    pub struct MemoryStorage {
        pub objects: Mutex<Vec<(String, String, usize, String)>>,
    }

    #[async_trait]
    impl ObjectStorage for MemoryStorage {
        async fn upload(
            &self,
            bucket: &str,
            path: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> StorageResult<()> {
            self.objects.lock().unwrap().push((
                bucket.to_string(),
                path.to_string(),
                bytes.len(),
                content_type.to_string(),
            ));
            Ok(())
        }

        fn public_url(&self, bucket: &str, path: &str) -> String {
            format!(
                "{}/storage/v1/object/public/{}/{}",
                PROJECT,
                bucket.replace(' ', "%20"),
                path
            )
        }

        async fn create_signed_url(
            &self,
            bucket: &str,
            path: &str,
            expires_in: u64,
        ) -> StorageResult<String> {
            if path.contains("missing") {
                return Err(StorageError::Provider {
                    status: 400,
                    message: "Object not found".to_string(),
                });
            }
            Ok(format!(
                "{}/storage/v1/object/sign/{}/{}?token=t&expires={}",
                PROJECT, bucket, path, expires_in
            ))
        }
    }

    pub fn settings() -> ImageSettings {
        ImageSettings {
            bucket: "Testing HoneyBee".to_string(),
            folder: "products".to_string(),
            signed_url_ttl: 3600,
            max_file_size: 1024,
            max_files: 3,
        }
    }

    fn service() -> (Arc<MemoryStorage>, ImageService) {
        let storage = Arc::new(MemoryStorage::default());
        let service = ImageService::new(storage.clone(), settings());
        (storage, service)
    }

    fn upload(file_name: Option<&str>, content_type: &str, bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            file_name: file_name.map(str::to_string),
            content_type: content_type.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_mime_validation() {
        assert!(is_valid_image_mime("image/png"));
        assert!(is_valid_image_mime("IMAGE/JPEG"));
        assert!(is_valid_image_mime("image/svg+xml"));
        assert!(!is_valid_image_mime("application/pdf"));
        assert!(!is_valid_image_mime("image/tiff"));
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("image/webp"), "webp");
        assert_eq!(extension_for_mime("image/svg+xml"), "svg");
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("something/else"), "jpg");
    }

    #[test]
    fn test_object_key_shape() {
        let key = object_key("products", &upload(Some("comb.photo.png"), "image/png", b"x"));
        let (folder, file) = key.split_once('/').unwrap();
        assert_eq!(folder, "products");

        let (stem, ext) = file.rsplit_once('.').unwrap();
        assert_eq!(ext, "png");

        let (millis, suffix) = stem.split_once('-').unwrap();
        assert!(millis.parse::<u128>().is_ok());
        assert_eq!(suffix.len(), KEY_SUFFIX_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_object_key_extension_falls_back_to_mime() {
        let key = object_key("products", &upload(None, "image/webp", b"x"));
        assert!(key.ends_with(".webp"));

        let key = object_key("products", &upload(Some("noext"), "image/gif", b"x"));
        assert!(key.ends_with(".gif"));
    }

    #[tokio::test]
    async fn test_upload_returns_public_url() {
        let (storage, service) = service();

        let url = service
            .upload(upload(Some("jar.png"), "image/png", b"png-bytes"))
            .await
            .unwrap();

        assert!(url.starts_with(
            "https://demo.supabase.co/storage/v1/object/public/Testing%20HoneyBee/products/"
        ));
        assert!(url.ends_with(".png"));

        let objects = storage.objects.lock().unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].0, "Testing HoneyBee");
        assert_eq!(objects[0].2, 9);
        assert_eq!(objects[0].3, "image/png");
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_files() {
        let (storage, service) = service();

        let err = service
            .upload(upload(Some("doc.pdf"), "application/pdf", b"pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = service
            .upload(upload(Some("empty.png"), "image/png", b""))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = service
            .upload(upload(Some("big.png"), "image/png", &[0u8; 1025]))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge(_)));

        assert!(storage.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_all_validates_before_uploading() {
        let (storage, service) = service();

        let result = service
            .upload_all(vec![
                upload(Some("a.png"), "image/png", b"a"),
                upload(Some("b.txt"), "text/plain", b"b"),
            ])
            .await;

        assert!(result.is_err());
        assert!(storage.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sign_urls_drops_failures_and_keeps_order() {
        let (_, service) = service();
        let urls = vec![
            "https://demo.supabase.co/storage/v1/object/public/bees/products/a.jpg".to_string(),
            "https://example.com/not-storage.jpg".to_string(),
            "https://demo.supabase.co/storage/v1/object/public/bees/products/missing.jpg"
                .to_string(),
            "https://demo.supabase.co/storage/v1/object/public/bees/products/b.jpg".to_string(),
        ];

        let signed = service.sign_urls(&urls).await;
        assert_eq!(signed.len(), 2);
        assert!(signed[0].contains("/sign/bees/products/a.jpg"));
        assert!(signed[0].ends_with("expires=3600"));
        assert!(signed[1].contains("/sign/bees/products/b.jpg"));
    }

    #[test]
    fn test_apply_text_fields() {
        let mut request = CreateProductRequest::default();
        apply_text_field(&mut request, "name", "Acacia Honey".into()).unwrap();
        apply_text_field(&mut request, "price", "12.50".into()).unwrap();
        apply_text_field(&mut request, "stock", "4".into()).unwrap();
        apply_text_field(&mut request, "image_url", "https://x/1.jpg".into()).unwrap();
        apply_text_field(&mut request, "image_url", "https://x/2.jpg".into()).unwrap();
        apply_text_field(&mut request, "category_name", "Raw".into()).unwrap();
        apply_text_field(&mut request, "unknown", "ignored".into()).unwrap();

        assert_eq!(request.name.as_deref(), Some("Acacia Honey"));
        assert_eq!(request.price, Some(Decimal::new(1250, 2)));
        assert_eq!(request.stock, Some(4));
        assert_eq!(request.image_url, vec!["https://x/1.jpg", "https://x/2.jpg"]);
        assert_eq!(request.category_name.as_deref(), Some("Raw"));
        assert!(request.category_id.is_none());
    }

    #[test]
    fn test_apply_text_field_errors() {
        let mut request = CreateProductRequest::default();

        apply_text_field(&mut request, "price", "abc".into()).unwrap();
        assert!(request.price.is_none());

        assert!(apply_text_field(&mut request, "stock", "many".into()).is_err());
        assert!(apply_text_field(&mut request, "category_id", "nope".into()).is_err());
    }
}
