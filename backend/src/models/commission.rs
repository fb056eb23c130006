//! Commission transaction model
//!
//! One row per (payment_reference, tier) pair, created when a completed
//! premium payment is processed. Rows are immutable once posted except for
//! the transition to Reversed; corrections happen through new offsetting
//! wallet rows, never by editing a commission in place.

use crate::models::rule::PaymentFrequency;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status of a commission transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    /// Recorded but not yet credited (earner's wallet was not active)
    Pending,

    /// Credited to the earner's wallet
    Posted,

    /// Backed out; the offsetting wallet row carries the reversal
    Reversed,
}

/// Errors from commission status transitions
#[derive(Debug, Error, PartialEq)]
pub enum CommissionError {
    #[error("commission is not pending (status: {status:?})")]
    NotPending { status: CommissionStatus },

    #[error("commission already reversed")]
    AlreadyReversed,
}

/// A single tier's commission for one payment event.
///
/// # Example
/// ```
/// use commission_ledger_core_rs::models::commission::{CommissionStatus, CommissionTransaction};
/// use commission_ledger_core_rs::models::rule::PaymentFrequency;
///
/// let tx = CommissionTransaction::new(
///     "PAY-0001".to_string(),
///     "AG-002".to_string(),   // earner (tier 2 ancestor)
///     "AG-001".to_string(),   // source (who generated the sale)
///     "PLAN_A".to_string(),
///     PaymentFrequency::Monthly,
///     2,
///     9_000,
///     1_000,
///     CommissionStatus::Posted,
///     1,
/// );
///
/// assert_eq!(tx.tier(), 2);
/// assert!(tx.is_posted());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionTransaction {
    /// Unique transaction identifier (UUID)
    id: String,

    /// External payment event reference; unique per payment, and the
    /// idempotency key for payment processing
    payment_reference: String,

    /// Agent earning this commission
    earner_code: String,

    /// Agent who generated the sale (tier 1 of the chain)
    source_code: String,

    /// Plan the premium was paid against
    plan_id: String,

    /// Payment frequency of the premium
    frequency: PaymentFrequency,

    /// Earner's position in the chain (1..=5)
    tier: u8,

    /// Premium amount the commission was computed against (cents)
    basis_amount: i64,

    /// Computed commission amount (cents)
    commission_amount: i64,

    /// Current status
    status: CommissionStatus,

    /// Store sequence number at creation (audit ordering)
    created_seq: u64,
}

impl CommissionTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        payment_reference: String,
        earner_code: String,
        source_code: String,
        plan_id: String,
        frequency: PaymentFrequency,
        tier: u8,
        basis_amount: i64,
        commission_amount: i64,
        status: CommissionStatus,
        created_seq: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            payment_reference,
            earner_code,
            source_code,
            plan_id,
            frequency,
            tier,
            basis_amount,
            commission_amount,
            status,
            created_seq,
        }
    }

    /// Get the transaction ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the payment reference
    pub fn payment_reference(&self) -> &str {
        &self.payment_reference
    }

    /// Get the earner's agent code
    pub fn earner_code(&self) -> &str {
        &self.earner_code
    }

    /// Get the source agent code (tier 1 of the chain)
    pub fn source_code(&self) -> &str {
        &self.source_code
    }

    /// Get the plan ID
    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    /// Get the payment frequency
    pub fn frequency(&self) -> PaymentFrequency {
        self.frequency
    }

    /// Get the tier (1-based)
    pub fn tier(&self) -> u8 {
        self.tier
    }

    /// Get the basis amount (cents)
    pub fn basis_amount(&self) -> i64 {
        self.basis_amount
    }

    /// Get the commission amount (cents)
    pub fn commission_amount(&self) -> i64 {
        self.commission_amount
    }

    /// Get the current status
    pub fn status(&self) -> CommissionStatus {
        self.status
    }

    /// Get the creation sequence number
    pub fn created_seq(&self) -> u64 {
        self.created_seq
    }

    /// Check whether the commission is pending
    pub fn is_pending(&self) -> bool {
        self.status == CommissionStatus::Pending
    }

    /// Check whether the commission has been posted
    pub fn is_posted(&self) -> bool {
        self.status == CommissionStatus::Posted
    }

    /// Check whether the commission has been reversed
    pub fn is_reversed(&self) -> bool {
        self.status == CommissionStatus::Reversed
    }

    /// Mark a pending commission as posted (wallet credit applied).
    ///
    /// Only Pending commissions can be posted; commissions created
    /// against an active wallet are born Posted.
    pub(crate) fn mark_posted(&mut self) -> Result<(), CommissionError> {
        match self.status {
            CommissionStatus::Pending => {
                self.status = CommissionStatus::Posted;
                Ok(())
            }
            status => Err(CommissionError::NotPending { status }),
        }
    }

    /// Mark a commission as reversed.
    ///
    /// Pending and Posted commissions can be reversed; reversing twice is
    /// an error because a second offsetting debit must be impossible.
    pub(crate) fn mark_reversed(&mut self) -> Result<(), CommissionError> {
        match self.status {
            CommissionStatus::Reversed => Err(CommissionError::AlreadyReversed),
            _ => {
                self.status = CommissionStatus::Reversed;
                Ok(())
            }
        }
    }
}
