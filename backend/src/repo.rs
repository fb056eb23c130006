//! Repository traits
//!
//! Explicit, typed persistence seams for each entity. The engine, ledger,
//! and workflow code are generic over these traits instead of reaching into
//! a concrete store, so a database-backed implementation can replace the
//! in-memory `LedgerState` without touching the core algorithms.
//!
//! `LedgerState` implements every trait here; see `models::state`.

use crate::models::agent::Agent;
use crate::models::commission::CommissionTransaction;
use crate::models::rule::{CommissionRule, PaymentFrequency};
use crate::models::state::StateError;
use crate::models::wallet::{Wallet, WalletTransaction};
use crate::models::withdrawal::WithdrawalRequest;

/// Source of the store-wide monotonically increasing sequence number.
///
/// Every mutation consumes one sequence number; events and rows stamped
/// with the same number describe the same logical mutation.
pub trait SequenceSource {
    /// Advance and return the next sequence number
    fn next_seq(&mut self) -> u64;
}

/// Read access to agents and the referral graph edges.
pub trait AgentRepo {
    /// Look up an agent by code
    fn agent(&self, agent_code: &str) -> Option<&Agent>;

    /// Mutable agent lookup
    fn agent_mut(&mut self, agent_code: &str) -> Option<&mut Agent>;

    /// All agents whose referrer is the given agent
    fn downline_of(&self, agent_code: &str) -> Vec<&Agent>;
}

/// Read access to commission rule configuration.
pub trait RuleRepo {
    /// All *active* rules matching a (plan, frequency, tier) key.
    ///
    /// More than one result is a configuration error the caller must
    /// surface; resolution never picks one arbitrarily.
    fn active_rules_for(
        &self,
        plan_id: &str,
        frequency: PaymentFrequency,
        tier: u8,
    ) -> Vec<&CommissionRule>;
}

/// Storage for commission transactions.
pub trait CommissionRepo {
    /// Look up a commission by ID
    fn commission(&self, id: &str) -> Option<&CommissionTransaction>;

    /// Mutable commission lookup
    fn commission_mut(&mut self, id: &str) -> Option<&mut CommissionTransaction>;

    /// All commissions created for a payment reference, tier order
    fn commissions_for_payment(&self, payment_reference: &str) -> Vec<&CommissionTransaction>;

    /// Insert a commission, enforcing (payment_reference, tier) uniqueness
    fn insert_commission(&mut self, tx: CommissionTransaction) -> Result<(), StateError>;

    /// IDs of pending commissions, optionally restricted to one earner,
    /// in creation order
    fn pending_commission_ids(&self, earner_code: Option<&str>) -> Vec<String>;
}

/// Storage for wallets and their append-only transaction rows.
pub trait WalletRepo {
    /// Look up a wallet by owning agent code
    fn wallet(&self, agent_code: &str) -> Option<&Wallet>;

    /// Mutable wallet lookup
    fn wallet_mut(&mut self, agent_code: &str) -> Option<&mut Wallet>;

    /// Append a wallet transaction row
    fn insert_wallet_transaction(&mut self, tx: WalletTransaction);

    /// All rows for a wallet, in write order
    fn wallet_transactions_for(&self, agent_code: &str) -> Vec<&WalletTransaction>;
}

/// Storage for withdrawal requests.
pub trait WithdrawalRepo {
    /// Look up a request by ID
    fn withdrawal(&self, id: &str) -> Option<&WithdrawalRequest>;

    /// Mutable request lookup
    fn withdrawal_mut(&mut self, id: &str) -> Option<&mut WithdrawalRequest>;

    /// Insert a new request
    fn insert_withdrawal(&mut self, request: WithdrawalRequest);

    /// Requests for an agent that are still Pending or Approved
    fn open_withdrawals_for(&self, agent_code: &str) -> Vec<&WithdrawalRequest>;
}
