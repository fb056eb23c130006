//! Wallet and wallet transaction models
//!
//! Each agent has exactly one wallet holding a cached balance plus running
//! totals. The cache is derived state: at all times
//!
//! ```text
//! wallet.balance == sum of signed amounts of its Completed WalletTransactions
//! ```
//!
//! Wallet rows are append-only. They are never edited or deleted; every
//! correction is a new offsetting row. Balance mutation happens only through
//! the `ledger` module, which is why the mutating methods here are
//! crate-private.
//!
//! CRITICAL: All money values are i64 (cents)

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by wallet balance mutations
#[derive(Debug, Error, PartialEq)]
pub enum WalletError {
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },
}

/// Status of a wallet.
///
/// Commission credits require an Active wallet; earnings for suspended or
/// frozen wallets are held as pending commissions until reactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    Active,
    Suspended,
    Frozen,
}

/// An agent's wallet.
///
/// # Example
/// ```
/// use commission_ledger_core_rs::models::wallet::{Wallet, WalletStatus};
///
/// let wallet = Wallet::new("AG-001".to_string());
/// assert_eq!(wallet.balance(), 0);
/// assert_eq!(wallet.status(), WalletStatus::Active);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Owning agent's code (one wallet per agent)
    agent_code: String,

    /// Cached running balance (cents); always equals the sum of signed
    /// amounts of this wallet's Completed transactions
    balance: i64,

    /// Lifetime commission earnings credited (cents)
    total_earned: i64,

    /// Lifetime withdrawals completed (cents)
    total_withdrawn: i64,

    /// Commission amount recorded but not yet credited because the wallet
    /// was not active (cents)
    pending_commission: i64,

    /// Current status
    status: WalletStatus,
}

impl Wallet {
    /// Create a new empty active wallet for an agent.
    pub fn new(agent_code: String) -> Self {
        Self {
            agent_code,
            balance: 0,
            total_earned: 0,
            total_withdrawn: 0,
            pending_commission: 0,
            status: WalletStatus::Active,
        }
    }

    /// Restore a wallet from snapshot fields (checkpoint loading).
    pub fn from_snapshot(
        agent_code: String,
        balance: i64,
        total_earned: i64,
        total_withdrawn: i64,
        pending_commission: i64,
        status: WalletStatus,
    ) -> Self {
        Self {
            agent_code,
            balance,
            total_earned,
            total_withdrawn,
            pending_commission,
            status,
        }
    }

    /// Get the owning agent's code
    pub fn agent_code(&self) -> &str {
        &self.agent_code
    }

    /// Get the current balance (cents)
    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Get lifetime earnings (cents)
    pub fn total_earned(&self) -> i64 {
        self.total_earned
    }

    /// Get lifetime withdrawals (cents)
    pub fn total_withdrawn(&self) -> i64 {
        self.total_withdrawn
    }

    /// Get held commission total (cents)
    pub fn pending_commission(&self) -> i64 {
        self.pending_commission
    }

    /// Get the current status
    pub fn status(&self) -> WalletStatus {
        self.status
    }

    /// Check whether the wallet is active
    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }

    /// Change the wallet status
    pub fn set_status(&mut self, status: WalletStatus) {
        self.status = status;
    }

    /// Increase the balance. Ledger use only.
    pub(crate) fn apply_credit(&mut self, amount: i64) {
        debug_assert!(amount > 0, "credit amount must be positive");
        self.balance += amount;
    }

    /// Decrease the balance, refusing to go negative. Ledger use only.
    pub(crate) fn apply_debit(&mut self, amount: i64) -> Result<(), WalletError> {
        debug_assert!(amount > 0, "debit amount must be positive");
        if amount > self.balance {
            return Err(WalletError::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Record lifetime earnings. Ledger use only.
    pub(crate) fn add_earned(&mut self, amount: i64) {
        self.total_earned += amount;
    }

    /// Back out lifetime earnings on commission reversal. Ledger use only.
    pub(crate) fn sub_earned(&mut self, amount: i64) {
        self.total_earned -= amount;
    }

    /// Record a completed withdrawal. Ledger use only.
    pub(crate) fn add_withdrawn(&mut self, amount: i64) {
        self.total_withdrawn += amount;
    }

    /// Hold a commission amount while the wallet is not active.
    pub(crate) fn hold_pending(&mut self, amount: i64) {
        self.pending_commission += amount;
    }

    /// Release a previously held commission amount.
    pub(crate) fn release_pending(&mut self, amount: i64) {
        debug_assert!(
            amount <= self.pending_commission,
            "releasing more than was held"
        );
        self.pending_commission -= amount;
    }
}

/// Kind of a wallet transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletTxKind {
    /// Commission or other inbound credit
    Credit,

    /// Generic outbound debit
    Debit,

    /// Admin balance correction (signed)
    Adjustment,

    /// Debit backing a completed withdrawal request
    Withdrawal,

    /// Offsetting debit backing a commission reversal
    Refund,
}

/// Status of a wallet transaction row.
///
/// Only Completed rows count toward the cached balance. The other states
/// exist for rows written by external settlement flows that stage before
/// completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletTxStatus {
    Pending,
    Completed,
    Cancelled,
    Failed,
}

/// Link from a wallet row back to the record that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TxLink {
    /// Commission transaction that was credited or reversed
    Commission(String),

    /// Withdrawal request that was completed
    Withdrawal(String),
}

/// One append-only ledger row for a wallet.
///
/// `amount` is signed: positive for credits, negative for debits and
/// withdrawals, either sign for adjustments. `balance_before` and
/// `balance_after` are captured atomically at write time, so
/// `balance_after == balance_before + amount` for every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// Unique row identifier (UUID)
    id: String,

    /// Wallet this row belongs to
    agent_code: String,

    /// Row kind
    kind: WalletTxKind,

    /// Signed amount applied to the balance (cents)
    amount: i64,

    /// Balance before this row was applied (cents)
    balance_before: i64,

    /// Balance after this row was applied (cents)
    balance_after: i64,

    /// Human-readable description
    description: String,

    /// Back-link to the causing commission or withdrawal, if any
    link: Option<TxLink>,

    /// Admin who issued the row, for adjustments
    admin_id: Option<String>,

    /// Row status; only Completed rows count toward the balance
    status: WalletTxStatus,

    /// Store sequence number at write time (audit ordering)
    seq: u64,
}

impl WalletTransaction {
    /// Create a Completed row. Ledger use only; `balance_after` is derived,
    /// never passed in.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        agent_code: String,
        kind: WalletTxKind,
        amount: i64,
        balance_before: i64,
        description: String,
        link: Option<TxLink>,
        admin_id: Option<String>,
        seq: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agent_code,
            kind,
            amount,
            balance_before,
            balance_after: balance_before + amount,
            description,
            link,
            admin_id,
            status: WalletTxStatus::Completed,
            seq,
        }
    }

    /// Restore a row from snapshot fields (checkpoint loading).
    #[allow(clippy::too_many_arguments)]
    pub fn from_snapshot(
        id: String,
        agent_code: String,
        kind: WalletTxKind,
        amount: i64,
        balance_before: i64,
        balance_after: i64,
        description: String,
        link: Option<TxLink>,
        admin_id: Option<String>,
        status: WalletTxStatus,
        seq: u64,
    ) -> Self {
        Self {
            id,
            agent_code,
            kind,
            amount,
            balance_before,
            balance_after,
            description,
            link,
            admin_id,
            status,
            seq,
        }
    }

    /// Get the row ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the wallet's agent code
    pub fn agent_code(&self) -> &str {
        &self.agent_code
    }

    /// Get the row kind
    pub fn kind(&self) -> WalletTxKind {
        self.kind
    }

    /// Get the signed amount (cents)
    pub fn signed_amount(&self) -> i64 {
        self.amount
    }

    /// Get the balance before this row (cents)
    pub fn balance_before(&self) -> i64 {
        self.balance_before
    }

    /// Get the balance after this row (cents)
    pub fn balance_after(&self) -> i64 {
        self.balance_after
    }

    /// Get the description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the back-link, if any
    pub fn link(&self) -> Option<&TxLink> {
        self.link.as_ref()
    }

    /// Get the issuing admin, for adjustments
    pub fn admin_id(&self) -> Option<&str> {
        self.admin_id.as_deref()
    }

    /// Get the row status
    pub fn status(&self) -> WalletTxStatus {
        self.status
    }

    /// Check whether the row counts toward the balance
    pub fn is_completed(&self) -> bool {
        self.status == WalletTxStatus::Completed
    }

    /// Get the write sequence number
    pub fn seq(&self) -> u64 {
        self.seq
    }
}
