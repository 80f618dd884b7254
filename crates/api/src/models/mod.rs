//! Domain models for the API.
//!
//! These types represent validated domain objects separate from database
//! row types, plus the response envelope every endpoint speaks.

pub mod cart;
pub mod catalog;
pub mod params;
pub mod response;
pub mod transaction;
pub mod user;

pub use cart::{CartItem, CartLine};
pub use catalog::{Category, Product, ProductWithCategory};
pub use params::ListParams;
pub use response::{ApiResponse, FieldError};
pub use transaction::{
    PricedLine, Pricing, ShippingSnapshot, Transaction, TransactionDetail, TransactionWithDetails,
};
pub use user::{CurrentUser, User};
