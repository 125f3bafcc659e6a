//! Profile routes for the authenticated caller

use axum::{Extension, Router, extract::State, routing::get};

use crate::{
    error::{ApiError, ApiResult},
    extract::ApiJson,
    middleware::AuthUser,
    models::{CreateProfileRequest, Profile, UpdateProfileRequest},
    response::Success,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(get_profile).put(update_profile).post(create_profile),
    )
}

fn profile_not_found() -> ApiError {
    ApiError::NotFound("Profile not found".to_string())
}

/// Get the caller's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Success<Profile>> {
    let profile = state
        .profile_repository
        .find_by_user_id(user.id)
        .await?
        .ok_or_else(profile_not_found)?;

    Ok(Success::ok(profile))
}

/// Update the caller's name and phone
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Success<Profile>> {
    let profile = state
        .profile_repository
        .update(user.id, &payload)
        .await?
        .ok_or_else(profile_not_found)?;

    Ok(Success::ok(profile))
}

/// Create the caller's profile
pub async fn create_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateProfileRequest>,
) -> ApiResult<Success<Profile>> {
    let profile = state.profile_repository.create(user.id, &payload).await?;
    Ok(Success::created(profile))
}
