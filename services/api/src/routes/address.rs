//! Address book routes, scoped to the authenticated caller

use axum::{
    Extension, Router,
    extract::State,
    routing::{get, put},
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    error::ApiResult,
    extract::{ApiJson, ApiPath},
    middleware::AuthUser,
    models::{Address, AddressInput},
    response::Success,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_addresses).post(create_address))
        .route("/:id", put(update_address).delete(delete_address))
}

pub async fn list_addresses(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Success<Vec<Address>>> {
    let addresses = state.address_repository.list_by_profile(user.id).await?;
    Ok(Success::ok(addresses))
}

pub async fn create_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<AddressInput>,
) -> ApiResult<Success<Address>> {
    let address = state.address_repository.create(user.id, &input).await?;
    Ok(Success::created(address))
}

/// Update an address; `data` is null when the caller owns no such address
pub async fn update_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<AddressInput>,
) -> ApiResult<Success<Option<Address>>> {
    let address = state
        .address_repository
        .update(id, user.id, &input)
        .await?;
    Ok(Success::ok(address))
}

pub async fn delete_address(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Success<Value>> {
    let removed = state.address_repository.delete(id, user.id).await?;
    tracing::debug!("Deleted {} address row(s) for {}", removed, user.id);

    Ok(Success::ok(
        json!({ "message": "Address deleted successfully" }),
    ))
}
