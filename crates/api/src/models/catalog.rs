//! Catalog domain types: categories and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use warung_core::{CategoryId, ProductId};

/// A product category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    /// Unique category ID.
    pub id: CategoryId,
    /// Category name (unique).
    pub name: String,
    /// Image reference, if set.
    pub image: Option<String>,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
    /// When the category was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A product in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Category this product belongs to.
    pub category_id: CategoryId,
    /// Product name (unique).
    pub name: String,
    /// Image reference.
    pub image: Option<String>,
    /// Unit price.
    pub price: Decimal,
    /// Free-form description.
    pub description: Option<String>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A product joined with its category, for detail and search responses.
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithCategory {
    #[serde(flatten)]
    pub product: Product,
    pub category: Category,
}
