//! Profile repository for database operations

use honey_common::error::DatabaseResult;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{CreateProfileRequest, Profile, UpdateProfileRequest};

/// Profile repository
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a new profile repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the profile linked to an auth user
    pub async fn find_by_user_id(&self, user_id: Uuid) -> DatabaseResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, name, phone, role, status, created_at, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Create the profile for an auth user
    pub async fn create(
        &self,
        user_id: Uuid,
        payload: &CreateProfileRequest,
    ) -> DatabaseResult<Profile> {
        info!("Creating profile for user: {}", user_id);

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id, name, phone, role, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING user_id, name, phone, role, status, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&payload.name)
        .bind(&payload.phone)
        .bind(&payload.role)
        .bind(&payload.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Update name and phone; returns None when the user has no profile
    pub async fn update(
        &self,
        user_id: Uuid,
        payload: &UpdateProfileRequest,
    ) -> DatabaseResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING user_id, name, phone, role, status, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&payload.name)
        .bind(&payload.phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}
