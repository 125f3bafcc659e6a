//! Application state shared across handlers

use sqlx::PgPool;

use crate::{
    middleware::JwtVerifier,
    repositories::{AddressRepository, CategoryRepository, ProductRepository, ProfileRepository},
    services::ImageService,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub profile_repository: ProfileRepository,
    pub address_repository: AddressRepository,
    pub category_repository: CategoryRepository,
    pub product_repository: ProductRepository,
    pub jwt_verifier: JwtVerifier,
    pub images: ImageService,
}

impl AppState {
    pub fn new(pool: PgPool, jwt_verifier: JwtVerifier, images: ImageService) -> Self {
        Self {
            profile_repository: ProfileRepository::new(pool.clone()),
            address_repository: AddressRepository::new(pool.clone()),
            category_repository: CategoryRepository::new(pool.clone()),
            product_repository: ProductRepository::new(pool.clone()),
            db_pool: pool,
            jwt_verifier,
            images,
        }
    }
}
