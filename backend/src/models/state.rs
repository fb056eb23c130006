//! Ledger state
//!
//! In-memory backing store for the commission and wallet ledger. Holds all
//! agents, wallets, rules, commission transactions, wallet transactions,
//! and withdrawal requests, plus the store-wide sequence counter.
//!
//! `LedgerState` implements the repository traits in `crate::repo`; the
//! engine and workflow code only see those traits.
//!
//! # Critical Invariants
//!
//! 1. **Balance cache**: every wallet's `balance` equals the sum of signed
//!    amounts of its Completed wallet transactions
//! 2. **Commission uniqueness**: at most one commission transaction exists
//!    per (payment_reference, tier) pair, enforced at insert
//! 3. **One wallet per agent**: registering an agent creates its wallet;
//!    neither is ever deleted
//! 4. **Append-only rows**: wallet transactions are inserted, never updated
//!    or removed

use crate::models::agent::Agent;
use crate::models::commission::{CommissionStatus, CommissionTransaction};
use crate::models::rule::{CommissionRule, PaymentFrequency};
use crate::models::wallet::{Wallet, WalletTransaction};
use crate::models::withdrawal::WithdrawalRequest;
use crate::repo::{
    AgentRepo, CommissionRepo, RuleRepo, SequenceSource, WalletRepo, WithdrawalRepo,
};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors raised by store-level integrity checks
#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("agent code already registered: {0}")]
    DuplicateAgentCode(String),

    #[error("referrer does not exist: {0}")]
    UnknownReferrer(String),

    #[error("agent cannot refer itself: {0}")]
    SelfReferral(String),

    #[error("commission already exists for payment {payment_reference} tier {tier}")]
    DuplicateCommission { payment_reference: String, tier: u8 },
}

/// Complete ledger state.
///
/// # Example
///
/// ```rust
/// use commission_ledger_core_rs::models::agent::Agent;
/// use commission_ledger_core_rs::models::state::LedgerState;
///
/// let mut state = LedgerState::new();
/// state.register_agent(Agent::new("AG-001".to_string(), None)).unwrap();
///
/// assert_eq!(state.num_agents(), 1);
/// assert!(state.get_wallet("AG-001").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    /// All agents, indexed by agent code
    agents: HashMap<String, Agent>,

    /// One wallet per agent, indexed by agent code
    wallets: HashMap<String, Wallet>,

    /// All commission rules, active and superseded
    rules: Vec<CommissionRule>,

    /// All commission transactions, indexed by ID
    commissions: HashMap<String, CommissionTransaction>,

    /// Commission IDs per payment reference
    commissions_by_payment: HashMap<String, Vec<String>>,

    /// Unique (payment_reference, tier) index
    commission_tiers: HashSet<(String, u8)>,

    /// All wallet transaction rows, indexed by ID
    wallet_txs: HashMap<String, WalletTransaction>,

    /// Row IDs per wallet, in write order
    wallet_txs_by_agent: HashMap<String, Vec<String>>,

    /// All withdrawal requests, indexed by ID
    withdrawals: HashMap<String, WithdrawalRequest>,

    /// Store-wide sequence counter; stamped on every mutation
    seq: u64,
}

impl LedgerState {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore state from snapshot parts (checkpoint loading).
    ///
    /// Rebuilds every index; commission uniqueness is re-enforced, so a
    /// tampered snapshot with duplicate (payment_reference, tier) pairs is
    /// rejected.
    pub fn from_snapshot(
        seq: u64,
        agents: Vec<Agent>,
        wallets: Vec<Wallet>,
        rules: Vec<CommissionRule>,
        commissions: Vec<CommissionTransaction>,
        mut wallet_transactions: Vec<WalletTransaction>,
        withdrawals: Vec<WithdrawalRequest>,
    ) -> Result<Self, StateError> {
        let mut state = Self {
            seq,
            rules,
            ..Self::default()
        };

        for agent in agents {
            state.agents.insert(agent.agent_code().to_string(), agent);
        }
        for wallet in wallets {
            state.wallets.insert(wallet.agent_code().to_string(), wallet);
        }
        for tx in commissions {
            state.insert_commission(tx)?;
        }

        // Per-wallet row order must match the original write order
        wallet_transactions.sort_by_key(|tx| tx.seq());
        for tx in wallet_transactions {
            state.insert_wallet_transaction(tx);
        }

        for request in withdrawals {
            state.withdrawals.insert(request.id().to_string(), request);
        }

        Ok(state)
    }

    /// Register a new agent and create their wallet.
    ///
    /// The referrer, if any, must already exist; a self-referral is
    /// rejected outright (it would be a one-node cycle).
    pub fn register_agent(&mut self, agent: Agent) -> Result<(), StateError> {
        let code = agent.agent_code().to_string();
        if self.agents.contains_key(&code) {
            return Err(StateError::DuplicateAgentCode(code));
        }
        if let Some(referrer) = agent.referrer_code() {
            if referrer == code {
                return Err(StateError::SelfReferral(code));
            }
            if !self.agents.contains_key(referrer) {
                return Err(StateError::UnknownReferrer(referrer.to_string()));
            }
        }

        self.wallets.insert(code.clone(), Wallet::new(code.clone()));
        self.agents.insert(code, agent);
        Ok(())
    }

    /// Add a commission rule as-is.
    ///
    /// No uniqueness check: a misconfigured second active rule for the same
    /// key must be observable in the store so resolution can surface it to
    /// an operator. Use `supersede_rule` for normal rule rollover.
    pub fn add_rule(&mut self, rule: CommissionRule) {
        self.rules.push(rule);
    }

    /// Deactivate any active rules matching the new rule's key, then add
    /// the new rule. Keeps the one-active-rule-per-key invariant for
    /// well-behaved writers.
    pub fn supersede_rule(&mut self, rule: CommissionRule) {
        for existing in self.rules.iter_mut() {
            if existing.is_active()
                && existing.matches(rule.plan_id(), rule.frequency(), rule.tier())
            {
                existing.deactivate();
            }
        }
        self.rules.push(rule);
    }

    /// Get reference to an agent by code
    pub fn get_agent(&self, agent_code: &str) -> Option<&Agent> {
        self.agents.get(agent_code)
    }

    /// Get mutable reference to an agent by code
    pub fn get_agent_mut(&mut self, agent_code: &str) -> Option<&mut Agent> {
        self.agents.get_mut(agent_code)
    }

    /// Get reference to a wallet by agent code
    pub fn get_wallet(&self, agent_code: &str) -> Option<&Wallet> {
        self.wallets.get(agent_code)
    }

    /// Get mutable reference to a wallet by agent code
    pub fn get_wallet_mut(&mut self, agent_code: &str) -> Option<&mut Wallet> {
        self.wallets.get_mut(agent_code)
    }

    /// Get reference to all agents
    pub fn agents(&self) -> &HashMap<String, Agent> {
        &self.agents
    }

    /// Get reference to all wallets
    pub fn wallets(&self) -> &HashMap<String, Wallet> {
        &self.wallets
    }

    /// Get reference to all rules
    pub fn rules(&self) -> &[CommissionRule] {
        &self.rules
    }

    /// Get reference to all commission transactions
    pub fn commissions(&self) -> &HashMap<String, CommissionTransaction> {
        &self.commissions
    }

    /// Get reference to all wallet transaction rows
    pub fn wallet_transactions(&self) -> &HashMap<String, WalletTransaction> {
        &self.wallet_txs
    }

    /// Get reference to all withdrawal requests
    pub fn withdrawals(&self) -> &HashMap<String, WithdrawalRequest> {
        &self.withdrawals
    }

    /// Get number of registered agents
    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    /// Get the current sequence counter without advancing it
    pub fn current_seq(&self) -> u64 {
        self.seq
    }

    /// Sum of all wallet balances (cents).
    ///
    /// Commission credits mint money into the system, so unlike a closed
    /// settlement network this total changes over time; it is still useful
    /// for cross-checking against the transaction log.
    pub fn total_balance(&self) -> i64 {
        self.wallets.values().map(|w| w.balance()).sum()
    }

    /// Sum of signed amounts of a wallet's Completed rows (cents).
    ///
    /// The balance cache invariant requires this to equal the wallet's
    /// `balance()` at all times.
    pub fn completed_transaction_sum(&self, agent_code: &str) -> i64 {
        self.wallet_txs_by_agent
            .get(agent_code)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.wallet_txs.get(id))
                    .filter(|tx| tx.is_completed())
                    .map(|tx| tx.signed_amount())
                    .sum()
            })
            .unwrap_or(0)
    }
}

impl SequenceSource for LedgerState {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

impl AgentRepo for LedgerState {
    fn agent(&self, agent_code: &str) -> Option<&Agent> {
        self.agents.get(agent_code)
    }

    fn agent_mut(&mut self, agent_code: &str) -> Option<&mut Agent> {
        self.agents.get_mut(agent_code)
    }

    fn downline_of(&self, agent_code: &str) -> Vec<&Agent> {
        let mut downline: Vec<&Agent> = self
            .agents
            .values()
            .filter(|a| a.referrer_code() == Some(agent_code))
            .collect();
        downline.sort_by(|a, b| a.agent_code().cmp(b.agent_code()));
        downline
    }
}

impl RuleRepo for LedgerState {
    fn active_rules_for(
        &self,
        plan_id: &str,
        frequency: PaymentFrequency,
        tier: u8,
    ) -> Vec<&CommissionRule> {
        self.rules
            .iter()
            .filter(|r| r.is_active() && r.matches(plan_id, frequency, tier))
            .collect()
    }
}

impl CommissionRepo for LedgerState {
    fn commission(&self, id: &str) -> Option<&CommissionTransaction> {
        self.commissions.get(id)
    }

    fn commission_mut(&mut self, id: &str) -> Option<&mut CommissionTransaction> {
        self.commissions.get_mut(id)
    }

    fn commissions_for_payment(&self, payment_reference: &str) -> Vec<&CommissionTransaction> {
        let mut txs: Vec<&CommissionTransaction> = self
            .commissions_by_payment
            .get(payment_reference)
            .map(|ids| ids.iter().filter_map(|id| self.commissions.get(id)).collect())
            .unwrap_or_default();
        txs.sort_by_key(|tx| tx.tier());
        txs
    }

    fn insert_commission(&mut self, tx: CommissionTransaction) -> Result<(), StateError> {
        let key = (tx.payment_reference().to_string(), tx.tier());
        if !self.commission_tiers.insert(key) {
            return Err(StateError::DuplicateCommission {
                payment_reference: tx.payment_reference().to_string(),
                tier: tx.tier(),
            });
        }

        self.commissions_by_payment
            .entry(tx.payment_reference().to_string())
            .or_default()
            .push(tx.id().to_string());
        self.commissions.insert(tx.id().to_string(), tx);
        Ok(())
    }

    fn pending_commission_ids(&self, earner_code: Option<&str>) -> Vec<String> {
        let mut pending: Vec<&CommissionTransaction> = self
            .commissions
            .values()
            .filter(|tx| tx.status() == CommissionStatus::Pending)
            .filter(|tx| earner_code.map_or(true, |code| tx.earner_code() == code))
            .collect();
        pending.sort_by_key(|tx| tx.created_seq());
        pending.iter().map(|tx| tx.id().to_string()).collect()
    }
}

impl WalletRepo for LedgerState {
    fn wallet(&self, agent_code: &str) -> Option<&Wallet> {
        self.wallets.get(agent_code)
    }

    fn wallet_mut(&mut self, agent_code: &str) -> Option<&mut Wallet> {
        self.wallets.get_mut(agent_code)
    }

    fn insert_wallet_transaction(&mut self, tx: WalletTransaction) {
        self.wallet_txs_by_agent
            .entry(tx.agent_code().to_string())
            .or_default()
            .push(tx.id().to_string());
        self.wallet_txs.insert(tx.id().to_string(), tx);
    }

    fn wallet_transactions_for(&self, agent_code: &str) -> Vec<&WalletTransaction> {
        self.wallet_txs_by_agent
            .get(agent_code)
            .map(|ids| ids.iter().filter_map(|id| self.wallet_txs.get(id)).collect())
            .unwrap_or_default()
    }
}

impl WithdrawalRepo for LedgerState {
    fn withdrawal(&self, id: &str) -> Option<&WithdrawalRequest> {
        self.withdrawals.get(id)
    }

    fn withdrawal_mut(&mut self, id: &str) -> Option<&mut WithdrawalRequest> {
        self.withdrawals.get_mut(id)
    }

    fn insert_withdrawal(&mut self, request: WithdrawalRequest) {
        self.withdrawals.insert(request.id().to_string(), request);
    }

    fn open_withdrawals_for(&self, agent_code: &str) -> Vec<&WithdrawalRequest> {
        let mut open: Vec<&WithdrawalRequest> = self
            .withdrawals
            .values()
            .filter(|r| r.agent_code() == agent_code && r.is_open())
            .collect();
        open.sort_by_key(|r| r.requested_seq());
        open
    }
}
