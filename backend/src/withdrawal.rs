//! Withdrawal workflow
//!
//! Drives a withdrawal request through its state machine and, on
//! completion, debits the agent's wallet through the ledger. The debit and
//! the status transition happen inside the same `&mut` store mutation: if
//! the debit fails the request stays Approved, and a completed request can
//! never be debited twice.
//!
//! Balance is deliberately not checked at request or approval time; it can
//! change between request and payout, so the only check that matters is the
//! one made by the debit at completion.

use crate::ledger::{self, LedgerError};
use crate::models::wallet::{TxLink, WalletTransaction};
use crate::models::withdrawal::{
    BankDetails, WithdrawalError, WithdrawalRequest, WithdrawalStatus,
};
use crate::repo::{SequenceSource, WalletRepo, WithdrawalRepo};
use thiserror::Error;

/// Errors from the withdrawal workflow
#[derive(Debug, Error, PartialEq)]
pub enum WorkflowError {
    #[error("unknown withdrawal request: {0}")]
    UnknownRequest(String),

    #[error("withdrawal amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    #[error("transition error: {0}")]
    Transition(#[from] WithdrawalError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Result of invoking `complete` on a request.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// The request transitioned to Completed and the wallet was debited
    Completed(WalletTransaction),

    /// The request was already Completed; nothing was debited
    AlreadyCompleted,
}

/// Create a Pending withdrawal request.
///
/// The wallet must exist and be active; requests against suspended or
/// frozen wallets are rejected outright. The balance is not checked here.
pub fn request<S: WalletRepo + WithdrawalRepo + SequenceSource>(
    store: &mut S,
    agent_code: &str,
    amount: i64,
    bank_details: BankDetails,
) -> Result<WithdrawalRequest, WorkflowError> {
    if amount <= 0 {
        return Err(WorkflowError::NonPositiveAmount(amount));
    }

    {
        let wallet = store
            .wallet(agent_code)
            .ok_or_else(|| LedgerError::UnknownWallet(agent_code.to_string()))?;
        if !wallet.is_active() {
            return Err(WorkflowError::Ledger(LedgerError::WalletNotActive {
                agent_code: agent_code.to_string(),
                status: wallet.status(),
            }));
        }
    }

    let seq = store.next_seq();
    let request = WithdrawalRequest::new(agent_code.to_string(), amount, bank_details, seq);
    store.insert_withdrawal(request.clone());
    Ok(request)
}

/// Approve a Pending request. No ledger effect.
pub fn approve<S: WithdrawalRepo + SequenceSource>(
    store: &mut S,
    request_id: &str,
    admin_id: &str,
    notes: &str,
) -> Result<WithdrawalRequest, WorkflowError> {
    ensure_pending(store, request_id, "approve")?;

    let seq = store.next_seq();
    let request = store
        .withdrawal_mut(request_id)
        .ok_or_else(|| WorkflowError::UnknownRequest(request_id.to_string()))?;
    request.approve(admin_id, notes, seq)?;
    Ok(request.clone())
}

/// Reject a Pending request. Terminal, no ledger effect.
pub fn reject<S: WithdrawalRepo + SequenceSource>(
    store: &mut S,
    request_id: &str,
    admin_id: &str,
    notes: &str,
) -> Result<WithdrawalRequest, WorkflowError> {
    ensure_pending(store, request_id, "reject")?;

    let seq = store.next_seq();
    let request = store
        .withdrawal_mut(request_id)
        .ok_or_else(|| WorkflowError::UnknownRequest(request_id.to_string()))?;
    request.reject(admin_id, notes, seq)?;
    Ok(request.clone())
}

// Status check before the sequence counter advances, so refused
// transitions leave no gap in the audit ordering.
fn ensure_pending<S: WithdrawalRepo>(
    store: &S,
    request_id: &str,
    action: &'static str,
) -> Result<(), WorkflowError> {
    let request = store
        .withdrawal(request_id)
        .ok_or_else(|| WorkflowError::UnknownRequest(request_id.to_string()))?;
    if request.status() != WithdrawalStatus::Pending {
        return Err(WithdrawalError::InvalidTransition {
            from: request.status(),
            action,
        }
        .into());
    }
    Ok(())
}

/// Complete an Approved request: debit the wallet and record the payout.
///
/// The debit runs first; if it fails (insufficient funds at completion
/// time) the request is untouched and remains Approved. Re-invoking on an
/// already Completed request is a no-op, never a second debit.
pub fn complete<S: WalletRepo + WithdrawalRepo + SequenceSource>(
    store: &mut S,
    request_id: &str,
    admin_id: &str,
    proof: &str,
) -> Result<CompletionOutcome, WorkflowError> {
    let (agent_code, amount) = {
        let request = store
            .withdrawal(request_id)
            .ok_or_else(|| WorkflowError::UnknownRequest(request_id.to_string()))?;
        if request.is_completed() {
            return Ok(CompletionOutcome::AlreadyCompleted);
        }
        if request.status() != WithdrawalStatus::Approved {
            return Err(WithdrawalError::InvalidTransition {
                from: request.status(),
                action: "complete",
            }
            .into());
        }
        (request.agent_code().to_string(), request.amount())
    };

    let row = ledger::debit(
        store,
        &agent_code,
        amount,
        &format!("withdrawal {}", request_id),
        Some(TxLink::Withdrawal(request_id.to_string())),
    )?;

    let seq = store.next_seq();
    let request = store
        .withdrawal_mut(request_id)
        .ok_or_else(|| WorkflowError::UnknownRequest(request_id.to_string()))?;
    request.complete(admin_id, proof, seq)?;

    Ok(CompletionOutcome::Completed(row))
}
