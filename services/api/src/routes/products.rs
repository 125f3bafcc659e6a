//! Public catalog routes

use axum::{Router, extract::State, routing::get};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extract::{ApiPath, ApiQuery},
    models::{ProductListResponse, ProductQuery, ProductView},
    response::Success,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_listed_product))
        .route("/category/:category_id", get(list_products_by_category))
}

/// In-stock products matching the query filters
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<Success<ProductListResponse>> {
    let filter = query.into_filter().map_err(ApiError::BadRequest)?;

    let rows = state.product_repository.list_public(&filter).await?;
    let products = state.images.sign_listed_all(rows).await;

    Ok(Success::ok(ProductListResponse::new(products, &filter)))
}

pub async fn get_listed_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Success<ProductView>> {
    let product = state
        .product_repository
        .find_listed_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Success::ok(state.images.sign_listed(product).await))
}

/// Same as [`list_products`] with the category taken from the path
pub async fn list_products_by_category(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<Success<ProductListResponse>> {
    let mut filter = query.into_filter().map_err(ApiError::BadRequest)?;
    filter.category_id = Some(category_id);

    let rows = state.product_repository.list_public(&filter).await?;
    let products = state.images.sign_listed_all(rows).await;

    let mut response = ProductListResponse::new(products, &filter);
    response.category_id = Some(category_id);
    Ok(Success::ok(response))
}
