//! Cart repository for database operations.
//!
//! A cart is the set of `carts` rows keyed by `(user_id, product_id)`.
//! Both mutations here are atomic under concurrency: repeat adds bump the
//! quantity through a single upsert, and removal locks the line before
//! deciding between decrement and delete, so no update is ever lost.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use warung_core::{CategoryId, ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::{CartItem, CartLine};
use crate::models::catalog::Product;

/// What happened to the cart line during a remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Quantity went down by one; the line survives.
    Decremented(CartLine),
    /// Quantity was one; the line is gone.
    Removed,
    /// The cart has lines, but none for this product.
    NotInCart,
    /// The cart has no lines at all.
    EmptyCart,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List cart lines across all users, for the admin view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT c.user_id, c.quantity,
                   p.id, p.category_id, p.name, p.image, p.price, p.description,
                   p.created_at, p.updated_at
            FROM carts c
            JOIN products p ON p.id = c.product_id
            ORDER BY c.user_id, c.product_id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartItemRow::into_cart_item).collect())
    }

    /// List one user's cart lines with their products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT c.user_id, c.quantity,
                   p.id, p.category_id, p.name, p.image, p.price, p.description,
                   p.created_at, p.updated_at
            FROM carts c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.product_id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartItemRow::into_cart_item).collect())
    }

    /// Add one unit of a product to the user's cart.
    ///
    /// An existing line is incremented in place; N concurrent adds always
    /// land at quantity N.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartLine, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(
            r"
            INSERT INTO carts (user_id, product_id, quantity)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = carts.quantity + 1, updated_at = NOW()
            RETURNING user_id, product_id, quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into_cart_line())
    }

    /// Remove one unit of a product from the user's cart.
    ///
    /// The line is locked first, so a concurrent add and remove of the
    /// same line serialize instead of clobbering each other.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<RemoveOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let quantity: Option<i32> = sqlx::query_scalar(
            r"
            SELECT quantity FROM carts
            WHERE user_id = $1 AND product_id = $2
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(quantity) = quantity else {
            let has_lines: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM carts WHERE user_id = $1)")
                    .bind(user_id)
                    .fetch_one(&mut *tx)
                    .await?;
            // Nothing written; dropping the transaction rolls it back.
            return Ok(if has_lines {
                RemoveOutcome::NotInCart
            } else {
                RemoveOutcome::EmptyCart
            });
        };

        if quantity > 1 {
            let remaining: i32 = sqlx::query_scalar(
                r"
                UPDATE carts
                SET quantity = quantity - 1, updated_at = NOW()
                WHERE user_id = $1 AND product_id = $2
                RETURNING quantity
                ",
            )
            .bind(user_id)
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;

            Ok(RemoveOutcome::Decremented(CartLine {
                user_id,
                product_id,
                quantity: remaining,
            }))
        } else {
            sqlx::query("DELETE FROM carts WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            Ok(RemoveOutcome::Removed)
        }
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct CartLineRow {
    user_id: i32,
    product_id: i32,
    quantity: i32,
}

impl CartLineRow {
    fn into_cart_line(self) -> CartLine {
        CartLine {
            user_id: UserId::new(self.user_id),
            product_id: ProductId::new(self.product_id),
            quantity: self.quantity,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    user_id: i32,
    quantity: i32,
    id: i32,
    category_id: i32,
    name: String,
    image: Option<String>,
    price: Decimal,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartItemRow {
    fn into_cart_item(self) -> CartItem {
        CartItem {
            user_id: UserId::new(self.user_id),
            quantity: self.quantity,
            product: Product {
                id: ProductId::new(self.id),
                category_id: CategoryId::new(self.category_id),
                name: self.name,
                image: self.image,
                price: self.price,
                description: self.description,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
        }
    }
}
