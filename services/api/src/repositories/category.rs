//! Category repository for database operations

use honey_common::error::DatabaseResult;
use sqlx::PgPool;
use tracing::info;

use crate::models::Category;

/// Category repository
#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    /// Create a new category repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All categories ordered by name
    pub async fn list(&self) -> DatabaseResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Insert a category; fails with a unique violation if the name exists
    pub async fn create(&self, name: &str) -> DatabaseResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, description",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    /// Fetch a category by its exact name
    pub async fn find_by_name(&self, name: &str) -> DatabaseResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories WHERE name = $1",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    /// Return the category with this name, creating it if needed
    ///
    /// Concurrent creators race on the unique constraint; the loser reads
    /// the winner's row.
    pub async fn find_or_create(&self, name: &str) -> DatabaseResult<Category> {
        match self.create(name).await {
            Ok(category) => {
                info!("Created category: {}", category.name);
                Ok(category)
            }
            Err(e) if e.is_unique_violation() => self.find_by_name(name).await,
            Err(e) => Err(e),
        }
    }
}
