//! Wallet ledger
//!
//! The only component allowed to mutate wallet balances. Every operation:
//!
//! 1. Reads the current balance
//! 2. Applies the change to the cached balance (refusing overdraws)
//! 3. Appends a Completed WalletTransaction row capturing
//!    `balance_before` and `balance_after`
//!
//! All three steps happen inside one exclusive `&mut` store mutation, the
//! in-memory equivalent of a single storage transaction, so a failed
//! operation leaves no trace and a successful one is fully visible.
//!
//! # Critical Invariants
//!
//! 1. **Balance cache**: after every operation, the wallet balance equals
//!    the sum of signed amounts of its Completed rows
//! 2. **No overdraw**: debits fail with `InsufficientFunds` rather than
//!    taking a wallet negative; no partial debit occurs
//! 3. **Audit trail**: admin adjustments always carry the admin's ID and a
//!    non-empty human-readable note

use crate::models::wallet::{TxLink, WalletError, WalletStatus, WalletTransaction, WalletTxKind};
use crate::repo::{SequenceSource, WalletRepo};
use thiserror::Error;

/// Errors from ledger operations
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("unknown wallet: {0}")]
    UnknownWallet(String),

    #[error("wallet {agent_code} is {status:?}, not active")]
    WalletNotActive {
        agent_code: String,
        status: WalletStatus,
    },

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    #[error("adjustment delta must be non-zero")]
    ZeroAdjustment,

    #[error("admin adjustments require a non-empty audit note")]
    AuditNoteRequired,

    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),
}

/// Credit an active wallet.
///
/// Commission-linked credits (link = `TxLink::Commission`) also add to the
/// wallet's lifetime earnings. The engine never calls this for suspended or
/// frozen wallets; it holds those commissions as pending instead.
///
/// # Arguments
/// * `agent_code` - Owning agent of the wallet to credit
/// * `amount` - Amount in cents (must be positive)
/// * `description` - Human-readable reason recorded on the row
/// * `link` - Back-link to the causing record, if any
pub fn credit<S: WalletRepo + SequenceSource>(
    store: &mut S,
    agent_code: &str,
    amount: i64,
    description: &str,
    link: Option<TxLink>,
) -> Result<WalletTransaction, LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::NonPositiveAmount(amount));
    }

    let balance_before = {
        let wallet = store
            .wallet(agent_code)
            .ok_or_else(|| LedgerError::UnknownWallet(agent_code.to_string()))?;
        if !wallet.is_active() {
            return Err(LedgerError::WalletNotActive {
                agent_code: agent_code.to_string(),
                status: wallet.status(),
            });
        }
        wallet.balance()
    };

    let is_commission = matches!(link, Some(TxLink::Commission(_)));
    {
        let wallet = store
            .wallet_mut(agent_code)
            .ok_or_else(|| LedgerError::UnknownWallet(agent_code.to_string()))?;
        wallet.apply_credit(amount);
        if is_commission {
            wallet.add_earned(amount);
        }
    }

    let seq = store.next_seq();
    let row = WalletTransaction::new(
        agent_code.to_string(),
        WalletTxKind::Credit,
        amount,
        balance_before,
        description.to_string(),
        link,
        None,
        seq,
    );
    store.insert_wallet_transaction(row.clone());
    Ok(row)
}

/// Debit an active wallet.
///
/// Fails with `InsufficientFunds` when the amount exceeds the balance; no
/// partial debit occurs. The row kind follows the link: a withdrawal link
/// produces a Withdrawal row (counted in `total_withdrawn`), a commission
/// link produces a Refund row (backed out of `total_earned`), and no link
/// produces a plain Debit row.
pub fn debit<S: WalletRepo + SequenceSource>(
    store: &mut S,
    agent_code: &str,
    amount: i64,
    description: &str,
    link: Option<TxLink>,
) -> Result<WalletTransaction, LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::NonPositiveAmount(amount));
    }

    let balance_before = {
        let wallet = store
            .wallet(agent_code)
            .ok_or_else(|| LedgerError::UnknownWallet(agent_code.to_string()))?;
        if !wallet.is_active() {
            return Err(LedgerError::WalletNotActive {
                agent_code: agent_code.to_string(),
                status: wallet.status(),
            });
        }
        wallet.balance()
    };

    let kind = match link {
        Some(TxLink::Withdrawal(_)) => WalletTxKind::Withdrawal,
        Some(TxLink::Commission(_)) => WalletTxKind::Refund,
        None => WalletTxKind::Debit,
    };

    {
        let wallet = store
            .wallet_mut(agent_code)
            .ok_or_else(|| LedgerError::UnknownWallet(agent_code.to_string()))?;
        wallet.apply_debit(amount)?;
        match kind {
            WalletTxKind::Withdrawal => wallet.add_withdrawn(amount),
            WalletTxKind::Refund => wallet.sub_earned(amount),
            _ => {}
        }
    }

    let seq = store.next_seq();
    let row = WalletTransaction::new(
        agent_code.to_string(),
        kind,
        -amount,
        balance_before,
        description.to_string(),
        link,
        None,
        seq,
    );
    store.insert_wallet_transaction(row.clone());
    Ok(row)
}

/// Apply an admin balance correction.
///
/// `delta` is signed: positive corrections credit, negative corrections
/// debit (still subject to the no-overdraw rule). Adjustments are allowed
/// on suspended and frozen wallets, since corrections are precisely what
/// those states tend to need, but they always record the admin's ID and a
/// mandatory note.
pub fn adjust_balance<S: WalletRepo + SequenceSource>(
    store: &mut S,
    agent_code: &str,
    delta: i64,
    admin_id: &str,
    notes: &str,
) -> Result<WalletTransaction, LedgerError> {
    if delta == 0 {
        return Err(LedgerError::ZeroAdjustment);
    }
    if notes.trim().is_empty() {
        return Err(LedgerError::AuditNoteRequired);
    }

    let balance_before = {
        let wallet = store
            .wallet(agent_code)
            .ok_or_else(|| LedgerError::UnknownWallet(agent_code.to_string()))?;
        wallet.balance()
    };

    {
        let wallet = store
            .wallet_mut(agent_code)
            .ok_or_else(|| LedgerError::UnknownWallet(agent_code.to_string()))?;
        if delta > 0 {
            wallet.apply_credit(delta);
        } else {
            wallet.apply_debit(-delta)?;
        }
    }

    let seq = store.next_seq();
    let row = WalletTransaction::new(
        agent_code.to_string(),
        WalletTxKind::Adjustment,
        delta,
        balance_before,
        notes.to_string(),
        None,
        Some(admin_id.to_string()),
        seq,
    );
    store.insert_wallet_transaction(row.clone());
    Ok(row)
}
