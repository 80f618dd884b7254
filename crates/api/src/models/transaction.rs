//! Transaction domain types and checkout pricing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use warung_core::{
    PaymentMethod, PaymentStatus, ProductId, TransactionDetailId, TransactionId, UserId,
};

/// A checkout converted into an order awaiting settlement.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    /// Unique transaction ID.
    pub id: TransactionId,
    /// Customer who checked out.
    pub user_id: UserId,
    /// Sum of `price * quantity` over all lines.
    pub sub_total: Decimal,
    /// 10% of the subtotal.
    pub tax: Decimal,
    /// 2% of the subtotal.
    pub delivery_fee: Decimal,
    /// `sub_total + tax + delivery_fee`.
    pub total_amount: Decimal,
    /// Settlement status (one-way: PENDING then SUCCESS or CANCELLED).
    pub status: PaymentStatus,
    /// How the customer pays.
    pub payment_method: PaymentMethod,
    /// Reference to the uploaded proof of payment, if any.
    pub proof: Option<String>,
    /// Shipping address snapshot taken at checkout.
    pub address: String,
    /// Shipping city snapshot.
    pub city: String,
    /// Shipping postal code snapshot.
    pub post_code: i32,
    /// Contact phone snapshot.
    pub phone_number: String,
    /// Free-form order notes.
    pub notes: Option<String>,
    /// When the checkout happened.
    pub created_at: DateTime<Utc>,
    /// When the transaction was last updated.
    pub updated_at: DateTime<Utc>,
}

/// One line of a transaction, with the unit price frozen at checkout time.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetail {
    /// Unique detail ID.
    pub id: TransactionDetailId,
    /// Parent transaction.
    pub transaction_id: TransactionId,
    /// Product purchased.
    pub product_id: ProductId,
    /// Unit price at checkout time (later catalog edits don't change it).
    pub price: Decimal,
    /// Units purchased.
    pub quantity: i32,
}

/// A transaction together with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionWithDetails {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub details: Vec<TransactionDetail>,
}

/// The resolved shipping destination for a checkout.
///
/// Built by merging request fields over the stored profile; every field
/// is required by the time this struct exists.
#[derive(Debug, Clone)]
pub struct ShippingSnapshot {
    pub address: String,
    pub city: String,
    pub post_code: i32,
    pub phone_number: String,
}

/// One cart line priced for checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub price: Decimal,
    pub quantity: i32,
}

/// Checkout money breakdown.
///
/// All derivation happens in exact decimal arithmetic; the percentage
/// components are rounded to 2 decimal places (banker's rounding) and the
/// total is the exact sum of the three parts, so
/// `total_amount == sub_total + tax + delivery_fee` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub sub_total: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

/// Tax rate applied to the subtotal (10%).
fn tax_rate() -> Decimal {
    Decimal::new(10, 2)
}

/// Delivery fee rate applied to the subtotal (2%).
fn delivery_fee_rate() -> Decimal {
    Decimal::new(2, 2)
}

impl Pricing {
    /// Price a set of cart lines.
    #[must_use]
    pub fn from_lines(lines: &[PricedLine]) -> Self {
        let sub_total: Decimal = lines
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum();
        let tax = (sub_total * tax_rate()).round_dp(2);
        let delivery_fee = (sub_total * delivery_fee_rate()).round_dp(2);
        let total = sub_total + tax + delivery_fee;

        Self {
            sub_total,
            tax,
            delivery_fee,
            total,
        }
    }
}
