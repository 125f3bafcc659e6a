//! Seller product management
//!
//! Everything except `GET /product/:id` requires a valid access token, and
//! mutations only ever touch rows whose `seller_id` is the caller.

use axum::{
    Extension, Router,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{HeaderMap, header::CONTENT_TYPE},
    middleware,
    routing::{get, put},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    middleware::{AuthUser, auth_middleware},
    models::{
        CreateProductRequest, NewProduct, Product, ProductChanges, ProductView,
        UpdateProductRequest,
    },
    response::Success,
    services::ImageUpload,
    state::AppState,
};

pub fn router(state: AppState) -> Router<AppState> {
    let body_limit = state.images.settings().max_body_size();

    let protected_routes = Router::new()
        .route("/", get(list_seller_products).post(create_product))
        .route("/:id", put(update_product).delete(delete_product))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/:id", get(get_product))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(body_limit))
}

fn product_not_found() -> ApiError {
    ApiError::NotFound("Product not found".to_string())
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// The caller's products with signed image URLs
pub async fn list_seller_products(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Success<Vec<ProductView>>> {
    let products = state.product_repository.list_by_seller(user.id).await?;
    Ok(Success::ok(state.images.sign_products(products).await))
}

/// Create a product from a JSON body or a multipart form with image files
pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    request: Request,
) -> ApiResult<Success<Product>> {
    let (payload, images) = if is_multipart(request.headers()) {
        let multipart = Multipart::from_request(request, &state).await?;
        let form = state.images.read_product_form(multipart).await?;
        (form.request, form.images)
    } else {
        let ApiJson(payload) =
            ApiJson::<CreateProductRequest>::from_request(request, &state).await?;
        (payload, Vec::<ImageUpload>::new())
    };

    let (name, price) = payload.validate().map_err(ApiError::BadRequest)?;
    state.images.check_all(&images)?;

    info!(seller = %user.id, role = ?user.role, "Creating product '{}'", name);

    let category_id = match (payload.category_id, payload.category_name.as_deref()) {
        (Some(id), _) => Some(id),
        (None, Some(category_name)) if !category_name.trim().is_empty() => {
            let category = state
                .category_repository
                .find_or_create(category_name.trim())
                .await?;
            Some(category.id)
        }
        _ => None,
    };

    let mut image_url = payload.image_url;
    if !images.is_empty() {
        image_url.extend(state.images.upload_all(images).await?);
    }

    let new_product = NewProduct {
        seller_id: user.id,
        category_id,
        name,
        description: payload.description,
        price,
        stock: payload.stock.unwrap_or(0),
        image_url,
    };

    let product = state.product_repository.create(&new_product).await?;
    Ok(Success::created(product))
}

/// Single product with signed image URLs; no authentication required
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Success<ProductView>> {
    let product = state
        .product_repository
        .find_by_id(id)
        .await?
        .ok_or_else(product_not_found)?;

    Ok(Success::ok(state.images.sign_product(product).await))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateProductRequest>,
) -> ApiResult<Success<Product>> {
    let changes = ProductChanges::try_from(payload).map_err(ApiError::BadRequest)?;
    info!(seller = %user.id, role = ?user.role, "Updating product {}", id);

    let product = state
        .product_repository
        .update(id, user.id, &changes)
        .await?
        .ok_or_else(product_not_found)?;

    Ok(Success::ok(product))
}

/// Delete a product and return the removed row
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Success<Product>> {
    info!(seller = %user.id, role = ?user.role, "Deleting product {}", id);

    let product = state
        .product_repository
        .delete(id, user.id)
        .await?
        .ok_or_else(product_not_found)?;

    Ok(Success::ok(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_is_multipart() {
        let mut headers = HeaderMap::new();
        assert!(!is_multipart(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_multipart(&headers));

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("Multipart/Form-Data; boundary=X-HONEY"),
        );
        assert!(is_multipart(&headers));
    }
}
