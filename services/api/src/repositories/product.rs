//! Product repository for database operations

use honey_common::error::DatabaseResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{ListedProduct, NewProduct, Product, ProductChanges, ProductFilter};

const PRODUCT_COLUMNS: &str = "id, seller_id, category_id, name, description, price, stock, \
                               image_url, created_at, updated_at";

const LISTING_SELECT: &str = "SELECT p.id, p.seller_id, p.category_id, p.name, p.description, \
     p.price, p.stock, p.image_url, p.created_at, p.updated_at, \
     pr.name AS seller_name, c.name AS category_name \
     FROM products p \
     LEFT JOIN profiles pr ON pr.user_id = p.seller_id \
     LEFT JOIN categories c ON c.id = p.category_id";

/// Product repository
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Create a new product repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new product
    pub async fn create(&self, product: &NewProduct) -> DatabaseResult<Product> {
        info!("Creating product '{}' for seller {}", product.name, product.seller_id);

        let sql = format!(
            r#"
            INSERT INTO products
                (seller_id, category_id, name, description, price, stock, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, Product>(&sql)
            .bind(product.seller_id)
            .bind(product.category_id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.stock)
            .bind(&product.image_url)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    /// All products of a seller, newest first
    pub async fn list_by_seller(&self, seller_id: Uuid) -> DatabaseResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE seller_id = $1 \
             ORDER BY created_at DESC, id"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(seller_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Find product by ID
    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Find product by ID together with seller and category names
    pub async fn find_listed_by_id(&self, id: Uuid) -> DatabaseResult<Option<ListedProduct>> {
        let sql = format!("{LISTING_SELECT} WHERE p.id = $1");

        let product = sqlx::query_as::<_, ListedProduct>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Apply the given changes to a product the seller owns
    ///
    /// `description` and `category_id` are written whenever they are present,
    /// so `Some(None)` clears them.
    pub async fn update(
        &self,
        id: Uuid,
        seller_id: Uuid,
        changes: &ProductChanges,
    ) -> DatabaseResult<Option<Product>> {
        let sql = format!(
            r#"
            UPDATE products
            SET name = COALESCE($3, name),
                description = CASE WHEN $9 THEN $4 ELSE description END,
                price = COALESCE($5, price),
                stock = COALESCE($6, stock),
                image_url = COALESCE($7, image_url),
                category_id = CASE WHEN $10 THEN $8 ELSE category_id END,
                updated_at = NOW()
            WHERE id = $1 AND seller_id = $2
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(seller_id)
            .bind(&changes.name)
            .bind(changes.description.clone().flatten())
            .bind(changes.price)
            .bind(changes.stock)
            .bind(&changes.image_url)
            .bind(changes.category_id.flatten())
            .bind(changes.description.is_some())
            .bind(changes.category_id.is_some())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Delete a product the seller owns, returning the removed row
    pub async fn delete(&self, id: Uuid, seller_id: Uuid) -> DatabaseResult<Option<Product>> {
        let sql = format!(
            "DELETE FROM products WHERE id = $1 AND seller_id = $2 RETURNING {PRODUCT_COLUMNS}"
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(seller_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// In-stock products matching the catalog filter
    pub async fn list_public(&self, filter: &ProductFilter) -> DatabaseResult<Vec<ListedProduct>> {
        let mut query = build_listing_query(filter);
        debug!("Listing products: {}", query.sql());

        let products = query
            .build_query_as::<ListedProduct>()
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }
}

/// Escape LIKE metacharacters so the search term matches literally
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn build_listing_query(filter: &ProductFilter) -> QueryBuilder<'_, Postgres> {
    let mut query = QueryBuilder::new(LISTING_SELECT);
    query.push(" WHERE p.stock > 0");

    if let Some(category_id) = filter.category_id {
        query.push(" AND p.category_id = ").push_bind(category_id);
    }

    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        query
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(min_price) = filter.min_price {
        query.push(" AND p.price >= ").push_bind(min_price);
    }

    if let Some(max_price) = filter.max_price {
        query.push(" AND p.price <= ").push_bind(max_price);
    }

    let (column, direction) = filter.sort.order_by();
    query.push(format!(" ORDER BY p.{column} {direction}, p.id"));
    query.push(" LIMIT ").push_bind(filter.limit);
    query.push(" OFFSET ").push_bind(filter.offset);

    query
}
