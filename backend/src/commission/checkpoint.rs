//! Checkpoint - save/load ledger state
//!
//! Serializes the complete ledger state for backup and migration, with a
//! SHA256 content hash and full invariant validation on restore. A
//! snapshot that fails either check is rejected rather than loaded.
//!
//! # Critical Invariants (re-checked on restore)
//!
//! - **Balance cache**: every wallet balance equals the sum of signed
//!   amounts of its Completed transaction rows
//! - **Held totals**: every wallet's pending_commission equals the sum of
//!   its Pending commission transactions
//! - **Referential integrity**: wallets belong to known agents, rows
//!   belong to known wallets, links point at known records
//! - **Commission uniqueness**: one transaction per (payment_reference,
//!   tier)

use crate::commission::engine::CommissionEngine;
use crate::models::agent::Agent;
use crate::models::commission::{CommissionStatus, CommissionTransaction};
use crate::models::rule::CommissionRule;
use crate::models::state::LedgerState;
use crate::models::wallet::{TxLink, Wallet, WalletTransaction};
use crate::models::withdrawal::WithdrawalRequest;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors from checkpoint operations
#[derive(Debug, Error, PartialEq)]
pub enum CheckpointError {
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("snapshot hash mismatch: expected {expected}, computed {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("snapshot validation failed: {0}")]
    Validation(String),
}

/// Complete ledger state snapshot.
///
/// Collections are sorted deterministically (agents and wallets by code,
/// transactions by sequence number) so the same state always produces the
/// same hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Store sequence counter at snapshot time
    pub seq: u64,

    pub agents: Vec<Agent>,
    pub wallets: Vec<Wallet>,
    pub rules: Vec<CommissionRule>,
    pub commissions: Vec<CommissionTransaction>,
    pub wallet_transactions: Vec<WalletTransaction>,
    pub withdrawals: Vec<WithdrawalRequest>,

    /// SHA256 hash of the canonical JSON of this snapshot (computed with
    /// this field empty)
    pub state_hash: String,
}

/// Capture a snapshot of the ledger state.
pub fn take_snapshot(state: &LedgerState) -> Result<LedgerSnapshot, CheckpointError> {
    let mut agents: Vec<Agent> = state.agents().values().cloned().collect();
    agents.sort_by(|a, b| a.agent_code().cmp(b.agent_code()));

    let mut wallets: Vec<Wallet> = state.wallets().values().cloned().collect();
    wallets.sort_by(|a, b| a.agent_code().cmp(b.agent_code()));

    let mut commissions: Vec<CommissionTransaction> =
        state.commissions().values().cloned().collect();
    commissions.sort_by_key(|tx| tx.created_seq());

    let mut wallet_transactions: Vec<WalletTransaction> =
        state.wallet_transactions().values().cloned().collect();
    wallet_transactions.sort_by_key(|tx| tx.seq());

    let mut withdrawals: Vec<WithdrawalRequest> =
        state.withdrawals().values().cloned().collect();
    withdrawals.sort_by_key(|r| r.requested_seq());

    let mut snapshot = LedgerSnapshot {
        seq: state.current_seq(),
        agents,
        wallets,
        rules: state.rules().to_vec(),
        commissions,
        wallet_transactions,
        withdrawals,
        state_hash: String::new(),
    };
    snapshot.state_hash = compute_state_hash(&snapshot)?;
    Ok(snapshot)
}

/// Restore ledger state from a snapshot, verifying the content hash and
/// every invariant first.
pub fn restore_snapshot(snapshot: LedgerSnapshot) -> Result<LedgerState, CheckpointError> {
    let expected = snapshot.state_hash.clone();
    let actual = compute_state_hash(&snapshot)?;
    if expected != actual {
        return Err(CheckpointError::HashMismatch { expected, actual });
    }

    validate_snapshot(&snapshot)?;

    LedgerState::from_snapshot(
        snapshot.seq,
        snapshot.agents,
        snapshot.wallets,
        snapshot.rules,
        snapshot.commissions,
        snapshot.wallet_transactions,
        snapshot.withdrawals,
    )
    .map_err(|e| CheckpointError::Validation(e.to_string()))
}

/// Compute the deterministic SHA256 hash of a snapshot.
///
/// Uses canonical JSON with sorted object keys, hashed with the
/// `state_hash` field emptied.
pub fn compute_state_hash(snapshot: &LedgerSnapshot) -> Result<String, CheckpointError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let mut unhashed = snapshot.clone();
    unhashed.state_hash.clear();

    let value = serde_json::to_value(&unhashed)
        .map_err(|e| CheckpointError::Serialization(e.to_string()))?;

    // Recursively sort all object keys for canonical representation
    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| CheckpointError::Serialization(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Validate snapshot integrity.
pub fn validate_snapshot(snapshot: &LedgerSnapshot) -> Result<(), CheckpointError> {
    let agent_codes: HashSet<&str> = snapshot
        .agents
        .iter()
        .map(|a| a.agent_code())
        .collect();
    let commission_ids: HashSet<&str> = snapshot.commissions.iter().map(|c| c.id()).collect();
    let withdrawal_ids: HashSet<&str> = snapshot.withdrawals.iter().map(|w| w.id()).collect();

    // 1. Every wallet belongs to a known agent
    for wallet in &snapshot.wallets {
        if !agent_codes.contains(wallet.agent_code()) {
            return Err(CheckpointError::Validation(format!(
                "wallet for unknown agent: {}",
                wallet.agent_code()
            )));
        }
    }
    let wallet_codes: HashSet<&str> = snapshot
        .wallets
        .iter()
        .map(|w| w.agent_code())
        .collect();

    // 2. Rows belong to known wallets and their links resolve
    let mut completed_sums: HashMap<&str, i64> = HashMap::new();
    for row in &snapshot.wallet_transactions {
        if !wallet_codes.contains(row.agent_code()) {
            return Err(CheckpointError::Validation(format!(
                "wallet transaction {} for unknown wallet: {}",
                row.id(),
                row.agent_code()
            )));
        }
        match row.link() {
            Some(TxLink::Commission(id)) if !commission_ids.contains(id.as_str()) => {
                return Err(CheckpointError::Validation(format!(
                    "wallet transaction {} links to unknown commission: {}",
                    row.id(),
                    id
                )));
            }
            Some(TxLink::Withdrawal(id)) if !withdrawal_ids.contains(id.as_str()) => {
                return Err(CheckpointError::Validation(format!(
                    "wallet transaction {} links to unknown withdrawal: {}",
                    row.id(),
                    id
                )));
            }
            _ => {}
        }
        if row.is_completed() {
            *completed_sums.entry(row.agent_code()).or_insert(0) += row.signed_amount();
        }
    }

    // 3. Balance cache and held totals match the underlying rows
    let mut pending_sums: HashMap<&str, i64> = HashMap::new();
    for tx in &snapshot.commissions {
        if tx.status() == CommissionStatus::Pending {
            *pending_sums.entry(tx.earner_code()).or_insert(0) += tx.commission_amount();
        }
    }
    for wallet in &snapshot.wallets {
        let expected = completed_sums
            .get(wallet.agent_code())
            .copied()
            .unwrap_or(0);
        if wallet.balance() != expected {
            return Err(CheckpointError::Validation(format!(
                "balance invariant violated for {}: cached {}, rows sum to {}",
                wallet.agent_code(),
                wallet.balance(),
                expected
            )));
        }
        let expected_pending = pending_sums
            .get(wallet.agent_code())
            .copied()
            .unwrap_or(0);
        if wallet.pending_commission() != expected_pending {
            return Err(CheckpointError::Validation(format!(
                "held commission mismatch for {}: cached {}, pending rows sum to {}",
                wallet.agent_code(),
                wallet.pending_commission(),
                expected_pending
            )));
        }
    }

    // 4. One commission per (payment_reference, tier)
    let mut seen_tiers = HashSet::new();
    for tx in &snapshot.commissions {
        if !seen_tiers.insert((tx.payment_reference(), tx.tier())) {
            return Err(CheckpointError::Validation(format!(
                "duplicate commission for payment {} tier {}",
                tx.payment_reference(),
                tx.tier()
            )));
        }
    }

    Ok(())
}

impl CommissionEngine<LedgerState> {
    /// Capture a snapshot of the engine's backing store.
    ///
    /// The event log is runtime observability, not ledger state, and is
    /// not part of snapshots.
    pub fn checkpoint(&self) -> Result<LedgerSnapshot, CheckpointError> {
        take_snapshot(self.store())
    }

    /// Rebuild an engine from a snapshot, starting a fresh event log.
    pub fn restore(snapshot: LedgerSnapshot) -> Result<Self, CheckpointError> {
        Ok(CommissionEngine::new(restore_snapshot(snapshot)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state_round_trip() {
        let state = LedgerState::new();
        let snapshot = take_snapshot(&state).unwrap();

        let restored = restore_snapshot(snapshot).unwrap();
        assert_eq!(restored.num_agents(), 0);
        assert_eq!(restored.current_seq(), 0);
    }

    #[test]
    fn test_hash_is_deterministic() {
        let mut state = LedgerState::new();
        state
            .register_agent(Agent::new("AG-001".to_string(), None))
            .unwrap();

        let a = take_snapshot(&state).unwrap();
        let b = take_snapshot(&state).unwrap();
        assert_eq!(a.state_hash, b.state_hash);
    }

    #[test]
    fn test_tampered_snapshot_rejected() {
        let mut state = LedgerState::new();
        state
            .register_agent(Agent::new("AG-001".to_string(), None))
            .unwrap();

        let mut snapshot = take_snapshot(&state).unwrap();
        snapshot.seq += 1; // tamper after hashing

        let err = restore_snapshot(snapshot).unwrap_err();
        assert!(matches!(err, CheckpointError::HashMismatch { .. }));
    }
}
