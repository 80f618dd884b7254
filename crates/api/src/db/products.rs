//! Product repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use warung_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::models::catalog::{Category, Product, ProductWithCategory};

/// Final product values to persist, used for both create and update.
#[derive(Debug, Clone)]
pub struct ProductWrite {
    pub category_id: CategoryId,
    pub name: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub description: Option<String>,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, image, price, description,
                   created_at, updated_at
            FROM products
            ORDER BY id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductRow::into_product).collect())
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, image, price, description,
                   created_at, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ProductRow::into_product))
    }

    /// Get a product joined with its category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_with_category(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductWithCategory>, RepositoryError> {
        let row = sqlx::query_as::<_, JoinedRow>(
            r"
            SELECT p.id, p.category_id, p.name, p.image, p.price, p.description,
                   p.created_at, p.updated_at,
                   c.name AS category_name, c.image AS category_image,
                   c.created_at AS category_created_at,
                   c.updated_at AS category_updated_at
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(JoinedRow::into_product_with_category))
    }

    /// Search products by name or category name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, term: &str) -> Result<Vec<ProductWithCategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, JoinedRow>(
            r"
            SELECT p.id, p.category_id, p.name, p.image, p.price, p.description,
                   p.created_at, p.updated_at,
                   c.name AS category_name, c.image AS category_image,
                   c.created_at AS category_created_at,
                   c.updated_at AS category_updated_at
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.name ILIKE $1 OR c.name ILIKE $1
            ORDER BY p.id DESC
            ",
        )
        .bind(like_pattern(term))
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(JoinedRow::into_product_with_category)
            .collect())
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, product: &ProductWrite) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (category_id, name, image, price, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, category_id, name, image, price, description,
                      created_at, updated_at
            ",
        )
        .bind(product.category_id)
        .bind(&product.name)
        .bind(product.image.as_deref())
        .bind(product.price)
        .bind(product.description.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.into_product())
    }

    /// Overwrite a product with merged values.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product or the target
    /// category does not exist. Returns `RepositoryError::Conflict` on a
    /// name collision. Returns `RepositoryError::Database` for other
    /// database errors.
    pub async fn update(
        &self,
        id: ProductId,
        product: &ProductWrite,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE products
            SET category_id = $2, name = $3, image = $4, price = $5,
                description = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING id, category_id, name, image, price, description,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(product.category_id)
        .bind(&product.name)
        .bind(product.image.as_deref())
        .bind(product.price)
        .bind(product.description.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.ok_or(RepositoryError::NotFound)?.into_product())
    }

    /// Delete a product. Cart lines referencing it cascade away.
    ///
    /// Returns `false` when no row matched the ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product appears in past
    /// transactions. Returns `RepositoryError::Database` for other errors.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "Product appears in transaction history".to_owned(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}

/// Map unique and foreign-key violations on product writes.
///
/// A foreign-key violation here means the referenced category does not
/// exist, so it surfaces as `NotFound` rather than `Conflict`.
fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict("Product name already exists".to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(e)
}

/// Wrap `term` for ILIKE matching, escaping LIKE wildcards in the input.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    category_id: i32,
    name: String,
    image: Option<String>,
    price: Decimal,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> Product {
        Product {
            id: ProductId::new(self.id),
            category_id: CategoryId::new(self.category_id),
            name: self.name,
            image: self.image,
            price: self.price,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct JoinedRow {
    id: i32,
    category_id: i32,
    name: String,
    image: Option<String>,
    price: Decimal,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_name: String,
    category_image: Option<String>,
    category_created_at: DateTime<Utc>,
    category_updated_at: DateTime<Utc>,
}

impl JoinedRow {
    fn into_product_with_category(self) -> ProductWithCategory {
        let category = Category {
            id: CategoryId::new(self.category_id),
            name: self.category_name,
            image: self.category_image,
            created_at: self.category_created_at,
            updated_at: self.category_updated_at,
        };
        let product = Product {
            id: ProductId::new(self.id),
            category_id: CategoryId::new(self.category_id),
            name: self.name,
            image: self.image,
            price: self.price,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };

        ProductWithCategory { product, category }
    }
}
