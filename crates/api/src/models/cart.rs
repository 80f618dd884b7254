//! Cart domain types.

use serde::Serialize;

use warung_core::{ProductId, UserId};

use super::catalog::Product;

/// One bare cart line, as written by add/remove operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartLine {
    /// Owner of the cart line.
    pub user_id: UserId,
    /// Product in the cart.
    pub product_id: ProductId,
    /// Number of units (always >= 1; a zero-quantity line is deleted).
    pub quantity: i32,
}

/// One cart line joined with its product, for list responses.
///
/// A user's cart holds at most one line per product; repeat adds bump
/// `quantity` instead of inserting a second line.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    /// Owner of the cart line.
    pub user_id: UserId,
    /// Number of units.
    pub quantity: i32,
    /// The product in the cart.
    pub product: Product,
}
