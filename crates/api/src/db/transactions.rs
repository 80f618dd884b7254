//! Transaction repository for database operations.
//!
//! Checkout is a single database transaction: the cart lines are read
//! under `FOR UPDATE`, priced, written out as a transaction plus details,
//! and the cart is cleared before the commit. Two concurrent checkouts of
//! the same cart serialize on the row locks; the loser finds an empty
//! cart and writes nothing.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use warung_core::{
    PaymentMethod, PaymentStatus, ProductId, TransactionDetailId, TransactionId, UserId,
};

use super::RepositoryError;
use crate::models::transaction::{
    PricedLine, Pricing, ShippingSnapshot, Transaction, TransactionDetail, TransactionWithDetails,
};

/// Repository for transaction database operations.
pub struct TransactionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TransactionRepository<'a> {
    /// Create a new transaction repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Convert the user's cart into a PENDING transaction, atomically.
    ///
    /// Returns `Ok(None)` when the cart has no lines; nothing is written
    /// in that case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// whole conversion rolls back.
    pub async fn checkout_cart(
        &self,
        user_id: UserId,
        shipping: &ShippingSnapshot,
        payment_method: PaymentMethod,
        notes: Option<&str>,
    ) -> Result<Option<TransactionWithDetails>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let lines: Vec<CheckoutLineRow> = sqlx::query_as(
            r"
            SELECT c.product_id, c.quantity, p.price
            FROM carts c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.product_id
            FOR UPDATE OF c
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            // Nothing written; dropping the transaction rolls it back.
            return Ok(None);
        }

        let priced: Vec<PricedLine> = lines.iter().map(CheckoutLineRow::to_priced_line).collect();
        let pricing = Pricing::from_lines(&priced);

        let transaction_row: TransactionRow = sqlx::query_as(
            r"
            INSERT INTO transactions
                (user_id, sub_total, tax, delivery_fee, total_amount, status,
                 payment_method, address, city, post_code, phone_number, notes)
            VALUES ($1, $2, $3, $4, $5, 'PENDING', $6, $7, $8, $9, $10, $11)
            RETURNING id, user_id, sub_total, tax, delivery_fee, total_amount,
                      status, payment_method, proof, address, city, post_code,
                      phone_number, notes, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(pricing.sub_total)
        .bind(pricing.tax)
        .bind(pricing.delivery_fee)
        .bind(pricing.total)
        .bind(payment_method.as_str())
        .bind(&shipping.address)
        .bind(&shipping.city)
        .bind(shipping.post_code)
        .bind(&shipping.phone_number)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut details = Vec::with_capacity(priced.len());
        for line in &priced {
            let detail_row: DetailRow = sqlx::query_as(
                r"
                INSERT INTO transaction_details (transaction_id, product_id, price, quantity)
                VALUES ($1, $2, $3, $4)
                RETURNING id, transaction_id, product_id, price, quantity
                ",
            )
            .bind(transaction_row.id)
            .bind(line.product_id)
            .bind(line.price)
            .bind(line.quantity)
            .fetch_one(&mut *tx)
            .await?;
            details.push(detail_row.into_detail());
        }

        sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(TransactionWithDetails {
            transaction: transaction_row.into_transaction()?,
            details,
        }))
    }

    /// Get a transaction with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if stored enum values are invalid.
    pub async fn find_by_id(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionWithDetails>, RepositoryError> {
        let row: Option<TransactionRow> = sqlx::query_as(
            r"
            SELECT id, user_id, sub_total, tax, delivery_fee, total_amount,
                   status, payment_method, proof, address, city, post_code,
                   phone_number, notes, created_at, updated_at
            FROM transactions
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let details: Vec<DetailRow> = sqlx::query_as(
            r"
            SELECT id, transaction_id, product_id, price, quantity
            FROM transaction_details
            WHERE transaction_id = $1
            ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(TransactionWithDetails {
            transaction: row.into_transaction()?,
            details: details.into_iter().map(DetailRow::into_detail).collect(),
        }))
    }

    /// Read the settlement gate state: current status and whether proof
    /// has been uploaded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored status is invalid.
    pub async fn find_status_and_proof(
        &self,
        id: TransactionId,
    ) -> Result<Option<(PaymentStatus, bool)>, RepositoryError> {
        let row: Option<GateRow> =
            sqlx::query_as("SELECT status, proof FROM transactions WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(|r| {
            let status: PaymentStatus = r.status.parse().map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid status in database: {e}"))
            })?;
            Ok((status, r.proof.is_some()))
        })
        .transpose()
    }

    /// List transactions across all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored enum values are invalid.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Transaction>, RepositoryError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r"
            SELECT id, user_id, sub_total, tax, delivery_fee, total_amount,
                   status, payment_method, proof, address, city, post_code,
                   phone_number, notes, created_at, updated_at
            FROM transactions
            ORDER BY id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TransactionRow::into_transaction).collect()
    }

    /// List one user's transactions with their lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if stored enum values are invalid.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<TransactionWithDetails>, RepositoryError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r"
            SELECT id, user_id, sub_total, tax, delivery_fee, total_amount,
                   status, payment_method, proof, address, city, post_code,
                   phone_number, notes, created_at, updated_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let detail_rows: Vec<DetailRow> = sqlx::query_as(
            r"
            SELECT id, transaction_id, product_id, price, quantity
            FROM transaction_details
            WHERE transaction_id = ANY($1)
            ORDER BY transaction_id, id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_transaction: HashMap<i32, Vec<TransactionDetail>> = HashMap::new();
        for detail_row in detail_rows {
            by_transaction
                .entry(detail_row.transaction_id)
                .or_default()
                .push(detail_row.into_detail());
        }

        rows.into_iter()
            .map(|row| {
                let details = by_transaction.remove(&row.id).unwrap_or_default();
                Ok(TransactionWithDetails {
                    transaction: row.into_transaction()?,
                    details,
                })
            })
            .collect()
    }

    /// Attach proof of payment to the customer's own transaction.
    ///
    /// Returns `false` when the transaction does not exist or belongs to
    /// another user; callers cannot tell the two apart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_proof(
        &self,
        id: TransactionId,
        user_id: UserId,
        proof: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE transactions
            SET proof = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(proof)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Move a PENDING transaction to a terminal status.
    ///
    /// The `status = 'PENDING'` guard makes settlement one-shot even under
    /// racing updates: exactly one of two concurrent settlements matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn settle_if_pending(
        &self,
        id: TransactionId,
        new_status: PaymentStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE transactions
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            ",
        )
        .bind(id)
        .bind(new_status.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct CheckoutLineRow {
    product_id: i32,
    quantity: i32,
    price: Decimal,
}

impl CheckoutLineRow {
    fn to_priced_line(&self) -> PricedLine {
        PricedLine {
            product_id: ProductId::new(self.product_id),
            price: self.price,
            quantity: self.quantity,
        }
    }
}

#[derive(sqlx::FromRow)]
struct GateRow {
    status: String,
    proof: Option<String>,
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: i32,
    user_id: i32,
    sub_total: Decimal,
    tax: Decimal,
    delivery_fee: Decimal,
    total_amount: Decimal,
    status: String,
    payment_method: String,
    proof: Option<String>,
    address: String,
    city: String,
    post_code: i32,
    phone_number: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    fn into_transaction(self) -> Result<Transaction, RepositoryError> {
        let status: PaymentStatus = self.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid status in database: {e}"))
        })?;
        let payment_method: PaymentMethod = self.payment_method.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment method in database: {e}"))
        })?;

        Ok(Transaction {
            id: TransactionId::new(self.id),
            user_id: UserId::new(self.user_id),
            sub_total: self.sub_total,
            tax: self.tax,
            delivery_fee: self.delivery_fee,
            total_amount: self.total_amount,
            status,
            payment_method,
            proof: self.proof,
            address: self.address,
            city: self.city,
            post_code: self.post_code,
            phone_number: self.phone_number,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DetailRow {
    id: i32,
    transaction_id: i32,
    product_id: i32,
    price: Decimal,
    quantity: i32,
}

impl DetailRow {
    fn into_detail(self) -> TransactionDetail {
        TransactionDetail {
            id: TransactionDetailId::new(self.id),
            transaction_id: TransactionId::new(self.transaction_id),
            product_id: ProductId::new(self.product_id),
            price: self.price,
            quantity: self.quantity,
        }
    }
}
