//! Withdrawal request model
//!
//! Admin-approved payout of wallet funds. The state machine is
//!
//! ```text
//! Pending -> Approved -> Completed
//! Pending -> Rejected
//! ```
//!
//! Completed is terminal and the only state that touches the ledger; the
//! debit happens in the `withdrawal` workflow module, in the same mutation
//! as the status change.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status of a withdrawal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

/// Errors from withdrawal status transitions
#[derive(Debug, Error, PartialEq)]
pub enum WithdrawalError {
    #[error("cannot {action} a withdrawal in {from:?} state")]
    InvalidTransition {
        from: WithdrawalStatus,
        action: &'static str,
    },
}

/// Payout destination captured at request time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
}

/// An agent's request to withdraw wallet funds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Unique request identifier (UUID)
    id: String,

    /// Requesting agent
    agent_code: String,

    /// Requested amount (cents)
    amount: i64,

    /// Payout destination
    bank_details: BankDetails,

    /// Current status
    status: WithdrawalStatus,

    /// Notes left by the processing admin
    admin_notes: Option<String>,

    /// External proof of payout (completion only)
    proof_reference: Option<String>,

    /// Admin who last processed the request
    processed_by: Option<String>,

    /// Store sequence number of the last admin action
    processed_seq: Option<u64>,

    /// Store sequence number at request time
    requested_seq: u64,
}

impl WithdrawalRequest {
    /// Create a new pending request. Balance is deliberately not checked
    /// here; it may change between request and approval, so the check
    /// happens at completion time.
    pub fn new(agent_code: String, amount: i64, bank_details: BankDetails, requested_seq: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agent_code,
            amount,
            bank_details,
            status: WithdrawalStatus::Pending,
            admin_notes: None,
            proof_reference: None,
            processed_by: None,
            processed_seq: None,
            requested_seq,
        }
    }

    /// Get the request ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the requesting agent's code
    pub fn agent_code(&self) -> &str {
        &self.agent_code
    }

    /// Get the requested amount (cents)
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Get the payout destination
    pub fn bank_details(&self) -> &BankDetails {
        &self.bank_details
    }

    /// Get the current status
    pub fn status(&self) -> WithdrawalStatus {
        self.status
    }

    /// Get the processing admin's notes
    pub fn admin_notes(&self) -> Option<&str> {
        self.admin_notes.as_deref()
    }

    /// Get the payout proof reference
    pub fn proof_reference(&self) -> Option<&str> {
        self.proof_reference.as_deref()
    }

    /// Get the admin who last processed the request
    pub fn processed_by(&self) -> Option<&str> {
        self.processed_by.as_deref()
    }

    /// Get the sequence number of the last admin action
    pub fn processed_seq(&self) -> Option<u64> {
        self.processed_seq
    }

    /// Get the sequence number at request time
    pub fn requested_seq(&self) -> u64 {
        self.requested_seq
    }

    pub fn is_pending(&self) -> bool {
        self.status == WithdrawalStatus::Pending
    }

    pub fn is_approved(&self) -> bool {
        self.status == WithdrawalStatus::Approved
    }

    pub fn is_rejected(&self) -> bool {
        self.status == WithdrawalStatus::Rejected
    }

    pub fn is_completed(&self) -> bool {
        self.status == WithdrawalStatus::Completed
    }

    /// Check whether the request still awaits a terminal state
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            WithdrawalStatus::Pending | WithdrawalStatus::Approved
        )
    }

    /// Pending -> Approved. No ledger effect.
    pub(crate) fn approve(&mut self, admin_id: &str, notes: &str, seq: u64) -> Result<(), WithdrawalError> {
        if self.status != WithdrawalStatus::Pending {
            return Err(WithdrawalError::InvalidTransition {
                from: self.status,
                action: "approve",
            });
        }
        self.status = WithdrawalStatus::Approved;
        self.record_admin_action(admin_id, notes, seq);
        Ok(())
    }

    /// Pending -> Rejected. Terminal, no ledger effect.
    pub(crate) fn reject(&mut self, admin_id: &str, notes: &str, seq: u64) -> Result<(), WithdrawalError> {
        if self.status != WithdrawalStatus::Pending {
            return Err(WithdrawalError::InvalidTransition {
                from: self.status,
                action: "reject",
            });
        }
        self.status = WithdrawalStatus::Rejected;
        self.record_admin_action(admin_id, notes, seq);
        Ok(())
    }

    /// Approved -> Completed. The caller must have already debited the
    /// wallet; this only records the transition.
    pub(crate) fn complete(&mut self, admin_id: &str, proof: &str, seq: u64) -> Result<(), WithdrawalError> {
        if self.status != WithdrawalStatus::Approved {
            return Err(WithdrawalError::InvalidTransition {
                from: self.status,
                action: "complete",
            });
        }
        self.status = WithdrawalStatus::Completed;
        self.proof_reference = Some(proof.to_string());
        self.processed_by = Some(admin_id.to_string());
        self.processed_seq = Some(seq);
        Ok(())
    }

    fn record_admin_action(&mut self, admin_id: &str, notes: &str, seq: u64) {
        if !notes.is_empty() {
            self.admin_notes = Some(notes.to_string());
        }
        self.processed_by = Some(admin_id.to_string());
        self.processed_seq = Some(seq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WithdrawalRequest {
        WithdrawalRequest::new(
            "AG-001".to_string(),
            50_000,
            BankDetails {
                bank_name: "First Coop Bank".to_string(),
                account_name: "Test Agent".to_string(),
                account_number: "0001-2345".to_string(),
            },
            1,
        )
    }

    #[test]
    fn test_happy_path() {
        let mut req = sample();
        assert!(req.is_pending());

        req.approve("admin-1", "verified", 2).unwrap();
        assert!(req.is_approved());
        assert_eq!(req.admin_notes(), Some("verified"));
        assert_eq!(req.processed_by(), Some("admin-1"));

        req.complete("admin-1", "gcash-ref-991", 3).unwrap();
        assert!(req.is_completed());
        assert_eq!(req.proof_reference(), Some("gcash-ref-991"));
        assert_eq!(req.processed_seq(), Some(3));
    }

    #[test]
    fn test_reject_is_terminal() {
        let mut req = sample();
        req.reject("admin-1", "unverified account", 2).unwrap();
        assert!(req.is_rejected());
        assert!(!req.is_open());

        let err = req.approve("admin-1", "", 3).unwrap_err();
        assert_eq!(
            err,
            WithdrawalError::InvalidTransition {
                from: WithdrawalStatus::Rejected,
                action: "approve",
            }
        );
    }

    #[test]
    fn test_complete_requires_approval() {
        let mut req = sample();
        let err = req.complete("admin-1", "proof", 2).unwrap_err();
        assert_eq!(
            err,
            WithdrawalError::InvalidTransition {
                from: WithdrawalStatus::Pending,
                action: "complete",
            }
        );
    }
}
