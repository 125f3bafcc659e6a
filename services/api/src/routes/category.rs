//! Category routes

use axum::{Router, extract::State, routing::get};

use crate::{error::ApiResult, models::Category, response::Success, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

/// All categories ordered by name
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Success<Vec<Category>>> {
    let categories = state.category_repository.list().await?;
    Ok(Success::ok(categories))
}
