//! Product models: rows, request payloads and catalog listing queries

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, de};
use sqlx::FromRow;
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const UNKNOWN_SELLER: &str = "Unknown Seller";
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Product entity; `image_url` holds public storage URLs
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product row joined with its seller and category names
#[derive(Debug, Clone, FromRow)]
pub struct ListedProduct {
    #[sqlx(flatten)]
    pub product: Product,
    pub seller_name: Option<String>,
    pub category_name: Option<String>,
}

/// Product as returned to clients, with signed image URLs
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
}

impl ProductView {
    pub fn new(product: Product, image_url: Vec<String>) -> Self {
        Self {
            id: product.id,
            seller_id: product.seller_id,
            category_id: product.category_id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            image_url,
            created_at: product.created_at,
            updated_at: product.updated_at,
            seller_name: None,
            category_name: None,
        }
    }

    /// Attach display names, falling back when the joins found nothing
    pub fn with_names(mut self, seller_name: Option<String>, category_name: Option<String>) -> Self {
        self.seller_name = Some(
            seller_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_SELLER.to_string()),
        );
        self.category_name = Some(category_name.unwrap_or_else(|| UNCATEGORIZED.to_string()));
        self
    }
}

/// Treat a blank string like an absent value; storefront forms send `""`
/// for fields the user left empty
fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(de::Error::custom),
    }
}

/// `null` becomes `Some(None)` so updates can clear a column
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Like [`nullable`], but a blank string leaves the column unchanged
fn nullable_id<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None => Ok(Some(None)),
        Some("") => Ok(None),
        Some(v) => v.parse().map(|id| Some(Some(id))).map_err(de::Error::custom),
    }
}

/// Product creation payload, from JSON or multipart text fields
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    #[serde(default)]
    pub image_url: Vec<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category_name: Option<String>,
}

/// Validated product ready for insertion
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub image_url: Vec<String>,
}

impl CreateProductRequest {
    /// Check the required fields, returning the trimmed name and the price
    pub fn validate(&self) -> Result<(String, Decimal), String> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| "Product name is required".to_string())?;

        let price = self
            .price
            .filter(|p| !p.is_sign_negative())
            .ok_or_else(|| "Valid price is required".to_string())?;

        if self.stock.is_some_and(|s| s < 0) {
            return Err("Stock cannot be negative".to_string());
        }

        Ok((name.to_string(), price))
    }
}

/// Product update payload; absent fields are left unchanged
///
/// `description` and `category_id` may be sent as `null` to clear them.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub image_url: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable_id")]
    pub category_id: Option<Option<Uuid>>,
}

/// Validated product update; `Some(None)` clears a nullable column
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub image_url: Option<Vec<String>>,
    pub category_id: Option<Option<Uuid>>,
}

impl TryFrom<UpdateProductRequest> for ProductChanges {
    type Error = String;

    fn try_from(req: UpdateProductRequest) -> Result<Self, Self::Error> {
        let name = match req.name {
            Some(name) if name.trim().is_empty() => {
                return Err("Product name cannot be empty".to_string());
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };

        if req.price.is_some_and(|p| p.is_sign_negative()) {
            return Err("Valid price is required".to_string());
        }
        if req.stock.is_some_and(|s| s < 0) {
            return Err("Stock cannot be negative".to_string());
        }

        Ok(ProductChanges {
            name,
            description: req.description,
            price: req.price,
            stock: req.stock,
            image_url: req.image_url,
            category_id: req.category_id,
        })
    }
}

/// Sort order for catalog listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    CreatedAtAsc,
    #[default]
    CreatedAtDesc,
}

impl ProductSort {
    /// Parse a `sort_by` value; unknown values fall back to newest first
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("price_asc") => ProductSort::PriceAsc,
            Some("price_desc") => ProductSort::PriceDesc,
            Some("name_asc") => ProductSort::NameAsc,
            Some("name_desc") => ProductSort::NameDesc,
            Some("created_at_asc") => ProductSort::CreatedAtAsc,
            _ => ProductSort::CreatedAtDesc,
        }
    }

    /// Column and direction for the ORDER BY clause
    pub fn order_by(&self) -> (&'static str, &'static str) {
        match self {
            ProductSort::PriceAsc => ("price", "ASC"),
            ProductSort::PriceDesc => ("price", "DESC"),
            ProductSort::NameAsc => ("name", "ASC"),
            ProductSort::NameDesc => ("name", "DESC"),
            ProductSort::CreatedAtAsc => ("created_at", "ASC"),
            ProductSort::CreatedAtDesc => ("created_at", "DESC"),
        }
    }
}

/// Query parameters for catalog listing, as sent by the storefront
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProductQuery {
    pub category_id: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort_by: Option<String>,
}

/// Normalized catalog filter
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: ProductSort,
    pub limit: i64,
    pub offset: i64,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_param<T: FromStr>(value: Option<&str>, name: &str) -> Result<Option<T>, String> {
    non_empty(value)
        .map(|v| v.parse::<T>().map_err(|_| format!("Invalid {}", name)))
        .transpose()
}

impl ProductQuery {
    /// Validate and normalize the raw query string values
    pub fn into_filter(self) -> Result<ProductFilter, String> {
        let limit = parse_param::<i64>(self.limit.as_deref(), "limit")?
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        let offset = parse_param::<i64>(self.offset.as_deref(), "offset")?
            .unwrap_or(0)
            .max(0);

        Ok(ProductFilter {
            category_id: parse_param(self.category_id.as_deref(), "category_id")?,
            search: non_empty(self.search.as_deref()).map(str::to_string),
            min_price: parse_param(self.min_price.as_deref(), "min_price")?,
            max_price: parse_param(self.max_price.as_deref(), "max_price")?,
            sort: ProductSort::parse(self.sort_by.as_deref()),
            limit,
            offset,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
    /// Number of products in this page
    pub total: usize,
}

/// Catalog listing response
#[derive(Debug, Clone, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    pub pagination: Pagination,
}

impl ProductListResponse {
    pub fn new(products: Vec<ProductView>, filter: &ProductFilter) -> Self {
        let total = products.len();
        Self {
            products,
            category_id: None,
            pagination: Pagination {
                limit: filter.limit,
                offset: filter.offset,
                total,
            },
        }
    }
}
