//! Transaction lifecycle: proof upload and status settlement.
//!
//! A transaction starts PENDING and settles exactly once, to SUCCESS or
//! CANCELLED. SUCCESS additionally requires that the customer has uploaded
//! proof of payment. Terminal states never change again.

use sqlx::PgPool;
use thiserror::Error;

use warung_core::{PaymentStatus, TransactionId, UserId};

use crate::db::RepositoryError;
use crate::db::transactions::TransactionRepository;

/// Errors from lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Requested target status is not SUCCESS or CANCELLED.
    #[error("status must be SUCCESS or CANCELLED")]
    InvalidStatus,

    /// Transaction does not exist (or, for proof upload, belongs to
    /// another user).
    #[error("transaction not found")]
    NotFound,

    /// Transaction has already left PENDING.
    #[error("transaction already settled")]
    AlreadySettled,

    /// SUCCESS requested without proof of payment on file.
    #[error("proof of payment required")]
    ProofRequired,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Transaction lifecycle service.
pub struct LifecycleService<'a> {
    transactions: TransactionRepository<'a>,
}

impl<'a> LifecycleService<'a> {
    /// Create a new lifecycle service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            transactions: TransactionRepository::new(pool),
        }
    }

    /// Attach proof of payment to the customer's own transaction.
    ///
    /// Overwrites any earlier proof and never changes the status; the
    /// admin settles separately.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::NotFound` if the transaction does not
    /// exist or belongs to another user; the two are indistinguishable
    /// on purpose.
    pub async fn upload_proof(
        &self,
        id: TransactionId,
        customer_id: UserId,
        proof: &str,
    ) -> Result<(), LifecycleError> {
        let updated = self.transactions.set_proof(id, customer_id, proof).await?;
        if updated {
            Ok(())
        } else {
            Err(LifecycleError::NotFound)
        }
    }

    /// Settle a PENDING transaction to `raw_status`.
    ///
    /// The gates run in order: parse the target, load the current state,
    /// reject non-PENDING, require proof for SUCCESS, then settle with a
    /// guarded UPDATE so a racing settlement cannot apply twice.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::InvalidStatus` if `raw_status` is not
    /// SUCCESS or CANCELLED. Returns `LifecycleError::NotFound` if the
    /// transaction does not exist. Returns `LifecycleError::AlreadySettled`
    /// if it already left PENDING. Returns `LifecycleError::ProofRequired`
    /// for SUCCESS without proof.
    pub async fn update_status(
        &self,
        id: TransactionId,
        raw_status: &str,
    ) -> Result<PaymentStatus, LifecycleError> {
        let target = parse_target_status(raw_status)?;

        let (current, has_proof) = self
            .transactions
            .find_status_and_proof(id)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        if current != PaymentStatus::Pending {
            return Err(LifecycleError::AlreadySettled);
        }
        if target == PaymentStatus::Success && !has_proof {
            return Err(LifecycleError::ProofRequired);
        }

        let settled = self.transactions.settle_if_pending(id, target).await?;
        if !settled {
            // Raced with another settlement between the gate read and the
            // guarded update.
            return Err(LifecycleError::AlreadySettled);
        }

        Ok(target)
    }
}

/// Parse a requested target status; PENDING is never a valid target.
fn parse_target_status(raw: &str) -> Result<PaymentStatus, LifecycleError> {
    let status: PaymentStatus = raw
        .trim()
        .to_uppercase()
        .parse()
        .map_err(|_| LifecycleError::InvalidStatus)?;

    if status.is_terminal() {
        Ok(status)
    } else {
        Err(LifecycleError::InvalidStatus)
    }
}
