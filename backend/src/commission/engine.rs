//! Commission engine
//!
//! Entry point for everything the platform asks of the ledger core:
//! payment-completion processing, pending-commission reconciliation,
//! wallet views, withdrawal administration, balance adjustments, and agent
//! decommissioning. The engine owns the backing store and the event log
//! and is the only place events are emitted.
//!
//! # Payment processing
//!
//! `on_payment_completed` runs in two phases:
//!
//! ```text
//! 1. Plan:   resolve the upline chain, resolve each tier's rule, compute
//!            amounts, and decide credit vs. hold from wallet status.
//!            Reads only; any fatal error aborts with no state change.
//! 2. Commit: insert commission rows, apply wallet credits in ascending
//!            agent-code order, record holds, emit events.
//! ```
//!
//! Every failure mode is checked during planning, so the commit phase
//! cannot fail halfway: the commission rows, wallet credits, and events of
//! one payment become visible together or not at all.
//!
//! # Critical Invariants
//!
//! 1. At most one commission transaction per (payment_reference, tier)
//! 2. Re-delivering a processed payment returns the prior result unchanged
//! 3. A held commission never touches the balance until synced
//! 4. Wallet credits within one payment apply in ascending agent-code
//!    order (fixed lock order for multi-wallet serialization)

use crate::admin::{self, AdminError};
use crate::ledger::{self, LedgerError};
use crate::models::commission::{CommissionError, CommissionStatus, CommissionTransaction};
use crate::models::event::{Event, EventLog};
use crate::models::rule::PaymentFrequency;
use crate::models::state::StateError;
use crate::models::wallet::{TxLink, WalletStatus, WalletTransaction};
use crate::models::withdrawal::{BankDetails, WithdrawalRequest};
use crate::referral::{self, ReferralError, MAX_COMMISSION_TIERS};
use crate::repo::{
    AgentRepo, CommissionRepo, RuleRepo, SequenceSource, WalletRepo, WithdrawalRepo,
};
use crate::rules;
use crate::withdrawal::{self, CompletionOutcome, WorkflowError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Configuration and boundary types
// ============================================================================

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How many chain tiers a payment can pay out to
    pub max_commission_tiers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_commission_tiers: MAX_COMMISSION_TIERS,
        }
    }
}

/// A completed premium payment, as delivered by the payment collaborator.
///
/// Delivery is at-least-once; `payment_reference` is the idempotency key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// External payment reference, unique per payment event
    pub payment_reference: String,

    /// Agent who enrolled the paying customer (tier 1 of the chain)
    pub paying_agent_code: String,

    /// Plan the premium was paid against
    pub plan_id: String,

    /// Premium amount (cents); the basis for percentage commissions
    pub basis_amount: i64,

    /// Premium payment frequency
    pub frequency: PaymentFrequency,
}

/// Read-only wallet summary exposed to collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletView {
    pub balance: i64,
    pub total_earned: i64,
    pub total_withdrawn: i64,
    pub pending_commission: i64,
    pub status: WalletStatus,
}

/// Errors from engine operations
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("basis amount must be positive, got {0}")]
    NonPositiveBasis(i64),

    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("unknown commission transaction: {0}")]
    UnknownCommission(String),

    #[error("admin operations require a non-empty audit note")]
    AuditNoteRequired,

    #[error("referral error: {0}")]
    Referral(#[from] ReferralError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("withdrawal error: {0}")]
    Withdrawal(#[from] WorkflowError),

    #[error("admin error: {0}")]
    Admin(#[from] AdminError),

    #[error("commission error: {0}")]
    Commission(#[from] CommissionError),

    #[error("state error: {0}")]
    State(#[from] StateError),
}

// ============================================================================
// Engine
// ============================================================================

/// One tier of a planned payout; produced by the read-only planning phase.
struct PlannedTier {
    earner_code: String,
    tier: u8,
    amount: i64,
    /// Some(status) when the earner's wallet is not active and the
    /// commission must be held instead of credited
    hold: Option<WalletStatus>,
}

/// The commission and wallet ledger engine.
///
/// Generic over the repository traits so a database-backed store can
/// replace the in-memory [`LedgerState`](crate::models::state::LedgerState).
///
/// # Example
///
/// ```rust
/// use commission_ledger_core_rs::commission::{CommissionEngine, PaymentEvent};
/// use commission_ledger_core_rs::models::agent::Agent;
/// use commission_ledger_core_rs::models::rule::{CommissionRate, CommissionRule, PaymentFrequency};
/// use commission_ledger_core_rs::models::state::LedgerState;
///
/// let mut state = LedgerState::new();
/// state.register_agent(Agent::new("AG-001".to_string(), None)).unwrap();
/// state.register_agent(Agent::new("AG-002".to_string(), Some("AG-001".to_string()))).unwrap();
/// state.add_rule(CommissionRule::new(
///     "PLAN_A".to_string(),
///     PaymentFrequency::Monthly,
///     1,
///     CommissionRate::Percentage { bps: 1000 },
/// ));
/// state.add_rule(CommissionRule::new(
///     "PLAN_A".to_string(),
///     PaymentFrequency::Monthly,
///     2,
///     CommissionRate::Percentage { bps: 500 },
/// ));
///
/// let mut engine = CommissionEngine::new(state);
/// let created = engine
///     .on_payment_completed(PaymentEvent {
///         payment_reference: "PAY-0001".to_string(),
///         paying_agent_code: "AG-002".to_string(),
///         plan_id: "PLAN_A".to_string(),
///         basis_amount: 10_000,
///         frequency: PaymentFrequency::Monthly,
///     })
///     .unwrap();
///
/// assert_eq!(created.len(), 2);
/// assert_eq!(engine.get_wallet("AG-002").unwrap().balance, 1_000);
/// assert_eq!(engine.get_wallet("AG-001").unwrap().balance, 500);
/// ```
#[derive(Debug)]
pub struct CommissionEngine<S> {
    store: S,
    events: EventLog,
    config: EngineConfig,
}

impl<S> CommissionEngine<S>
where
    S: AgentRepo + RuleRepo + CommissionRepo + WalletRepo + WithdrawalRepo + SequenceSource,
{
    /// Create an engine with the default configuration
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration
    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            events: EventLog::new(),
            config,
        }
    }

    /// Get the event log
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Get the configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the backing store mutably.
    ///
    /// Setup escape hatch for registering agents and rules; balance
    /// mutation still has to go through the ledger.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // ========================================================================
    // Payment processing
    // ========================================================================

    /// Process a completed premium payment.
    ///
    /// Walks the paying agent's upline chain and creates one commission
    /// transaction per configured tier, crediting each earner's wallet (or
    /// holding the commission when the wallet is not active). Re-delivery
    /// of an already-processed `payment_reference` returns the existing
    /// transactions unchanged.
    ///
    /// Tiers without a resolvable rule are skipped with a `TierSkipped`
    /// event; a cyclic referral chain aborts the whole call with no state
    /// change.
    pub fn on_payment_completed(
        &mut self,
        payment: PaymentEvent,
    ) -> Result<Vec<CommissionTransaction>, EngineError> {
        if payment.basis_amount <= 0 {
            return Err(EngineError::NonPositiveBasis(payment.basis_amount));
        }

        // Idempotency: a reference that already produced rows is done
        let existing: Vec<CommissionTransaction> = self
            .store
            .commissions_for_payment(&payment.payment_reference)
            .into_iter()
            .cloned()
            .collect();
        if !existing.is_empty() {
            let seq = self.store.next_seq();
            self.events.log(Event::DuplicatePayment {
                seq,
                payment_reference: payment.payment_reference.clone(),
                existing: existing.len(),
            });
            return Ok(existing);
        }

        // ---- Plan (reads only) ----
        let chain = referral::resolve_upline(
            &self.store,
            &payment.paying_agent_code,
            self.config.max_commission_tiers,
        )?;

        let mut planned: Vec<PlannedTier> = Vec::with_capacity(chain.len());
        let mut skipped: Vec<(u8, String)> = Vec::new();

        for (position, earner_code) in chain.iter().enumerate() {
            let tier = (position + 1) as u8;
            match rules::resolve(&self.store, &payment.plan_id, payment.frequency, tier) {
                Ok(rule) => {
                    let amount = rule.rate().amount_for(payment.basis_amount);
                    let wallet = self
                        .store
                        .wallet(earner_code)
                        .ok_or_else(|| EngineError::UnknownAgent(earner_code.clone()))?;
                    let hold = if wallet.is_active() {
                        None
                    } else {
                        Some(wallet.status())
                    };
                    planned.push(PlannedTier {
                        earner_code: earner_code.clone(),
                        tier,
                        amount,
                        hold,
                    });
                }
                Err(rule_err) => skipped.push((tier, rule_err.to_string())),
            }
        }

        // ---- Commit (pre-validated, all-or-nothing) ----
        let mut created: Vec<CommissionTransaction> = Vec::with_capacity(planned.len());
        for tier_plan in &planned {
            let seq = self.store.next_seq();
            let status = if tier_plan.hold.is_some() {
                CommissionStatus::Pending
            } else {
                CommissionStatus::Posted
            };
            let tx = CommissionTransaction::new(
                payment.payment_reference.clone(),
                tier_plan.earner_code.clone(),
                payment.paying_agent_code.clone(),
                payment.plan_id.clone(),
                payment.frequency,
                tier_plan.tier,
                payment.basis_amount,
                tier_plan.amount,
                status,
                seq,
            );
            self.store.insert_commission(tx.clone())?;
            created.push(tx);
        }

        // Wallet effects in ascending agent-code order, the fixed lock
        // order for multi-wallet credit sets
        let mut order: Vec<usize> = (0..planned.len()).collect();
        order.sort_by(|&a, &b| planned[a].earner_code.cmp(&planned[b].earner_code));

        for index in order {
            let tier_plan = &planned[index];
            let tx = &created[index];

            match tier_plan.hold {
                None => {
                    let row = ledger::credit(
                        &mut self.store,
                        &tier_plan.earner_code,
                        tier_plan.amount,
                        &format!(
                            "tier {} commission for payment {}",
                            tier_plan.tier, payment.payment_reference
                        ),
                        Some(TxLink::Commission(tx.id().to_string())),
                    )?;
                    self.events.log(Event::CommissionPosted {
                        seq: tx.created_seq(),
                        payment_reference: payment.payment_reference.clone(),
                        commission_id: tx.id().to_string(),
                        earner_code: tier_plan.earner_code.clone(),
                        tier: tier_plan.tier,
                        amount: tier_plan.amount,
                    });
                    self.events.log(Event::WalletCredited {
                        seq: row.seq(),
                        agent_code: tier_plan.earner_code.clone(),
                        tx_id: row.id().to_string(),
                        amount: tier_plan.amount,
                        balance_after: row.balance_after(),
                    });
                }
                Some(wallet_status) => {
                    let wallet = self
                        .store
                        .wallet_mut(&tier_plan.earner_code)
                        .ok_or_else(|| EngineError::UnknownAgent(tier_plan.earner_code.clone()))?;
                    wallet.hold_pending(tier_plan.amount);
                    self.events.log(Event::CommissionHeld {
                        seq: tx.created_seq(),
                        payment_reference: payment.payment_reference.clone(),
                        commission_id: tx.id().to_string(),
                        earner_code: tier_plan.earner_code.clone(),
                        tier: tier_plan.tier,
                        amount: tier_plan.amount,
                        wallet_status,
                    });
                }
            }
        }

        for (tier, reason) in skipped {
            let seq = self.store.next_seq();
            self.events.log(Event::TierSkipped {
                seq,
                payment_reference: payment.payment_reference.clone(),
                tier,
                reason,
            });
        }

        Ok(created)
    }

    /// Credit held commissions whose wallets have returned to active.
    ///
    /// Scans Pending commission transactions, optionally restricted to one
    /// earner. Each one whose wallet is now active is credited, released
    /// from the held total, and flipped to Posted. Returns how many were
    /// synced; commissions whose wallets are still not active stay put.
    pub fn sync_pending_commissions(
        &mut self,
        agent_code: Option<&str>,
    ) -> Result<usize, EngineError> {
        let pending_ids = self.store.pending_commission_ids(agent_code);
        let mut synced = 0;

        for commission_id in pending_ids {
            let (earner_code, amount) = {
                let tx = self
                    .store
                    .commission(&commission_id)
                    .ok_or_else(|| EngineError::UnknownCommission(commission_id.clone()))?;
                (tx.earner_code().to_string(), tx.commission_amount())
            };

            let wallet_active = self
                .store
                .wallet(&earner_code)
                .map(|w| w.is_active())
                .unwrap_or(false);
            if !wallet_active {
                continue;
            }

            let row = ledger::credit(
                &mut self.store,
                &earner_code,
                amount,
                &format!("held commission {} released", commission_id),
                Some(TxLink::Commission(commission_id.clone())),
            )?;

            let wallet = self
                .store
                .wallet_mut(&earner_code)
                .ok_or_else(|| EngineError::UnknownAgent(earner_code.clone()))?;
            wallet.release_pending(amount);

            self.store
                .commission_mut(&commission_id)
                .ok_or_else(|| EngineError::UnknownCommission(commission_id.clone()))?
                .mark_posted()?;

            self.events.log(Event::PendingCommissionSynced {
                seq: row.seq(),
                commission_id: commission_id.clone(),
                earner_code: earner_code.clone(),
                amount,
            });
            self.events.log(Event::WalletCredited {
                seq: row.seq(),
                agent_code: earner_code,
                tx_id: row.id().to_string(),
                amount,
                balance_after: row.balance_after(),
            });
            synced += 1;
        }

        Ok(synced)
    }

    /// Back out a commission.
    ///
    /// Posted commissions get an offsetting Refund debit in the same
    /// mutation as the status change; Pending commissions only release
    /// their hold (they were never credited) and produce no wallet row.
    /// Reversing twice is an error.
    pub fn reverse_commission(
        &mut self,
        commission_id: &str,
        admin_id: &str,
        notes: &str,
    ) -> Result<Option<WalletTransaction>, EngineError> {
        if notes.trim().is_empty() {
            return Err(EngineError::AuditNoteRequired);
        }

        let (earner_code, amount, status) = {
            let tx = self
                .store
                .commission(commission_id)
                .ok_or_else(|| EngineError::UnknownCommission(commission_id.to_string()))?;
            (
                tx.earner_code().to_string(),
                tx.commission_amount(),
                tx.status(),
            )
        };

        let row = match status {
            CommissionStatus::Reversed => {
                return Err(EngineError::Commission(CommissionError::AlreadyReversed));
            }
            CommissionStatus::Posted => Some(ledger::debit(
                &mut self.store,
                &earner_code,
                amount,
                &format!("reversal of commission {}: {}", commission_id, notes),
                Some(TxLink::Commission(commission_id.to_string())),
            )?),
            CommissionStatus::Pending => {
                let wallet = self
                    .store
                    .wallet_mut(&earner_code)
                    .ok_or_else(|| EngineError::UnknownAgent(earner_code.clone()))?;
                wallet.release_pending(amount);
                None
            }
        };

        self.store
            .commission_mut(commission_id)
            .ok_or_else(|| EngineError::UnknownCommission(commission_id.to_string()))?
            .mark_reversed()?;

        let seq = match &row {
            Some(row) => row.seq(),
            None => self.store.next_seq(),
        };
        self.events.log(Event::CommissionReversed {
            seq,
            commission_id: commission_id.to_string(),
            earner_code,
            amount,
            admin_id: admin_id.to_string(),
        });

        Ok(row)
    }

    // ========================================================================
    // Wallet surface
    // ========================================================================

    /// Get a read-only wallet summary
    pub fn get_wallet(&self, agent_code: &str) -> Result<WalletView, EngineError> {
        let wallet = self
            .store
            .wallet(agent_code)
            .ok_or_else(|| EngineError::UnknownAgent(agent_code.to_string()))?;
        Ok(WalletView {
            balance: wallet.balance(),
            total_earned: wallet.total_earned(),
            total_withdrawn: wallet.total_withdrawn(),
            pending_commission: wallet.pending_commission(),
            status: wallet.status(),
        })
    }

    /// Apply an admin balance correction through the ledger
    pub fn adjust_wallet_balance(
        &mut self,
        agent_code: &str,
        delta: i64,
        admin_id: &str,
        notes: &str,
    ) -> Result<WalletTransaction, EngineError> {
        let row = ledger::adjust_balance(&mut self.store, agent_code, delta, admin_id, notes)?;
        self.events.log(Event::BalanceAdjusted {
            seq: row.seq(),
            agent_code: agent_code.to_string(),
            tx_id: row.id().to_string(),
            delta,
            admin_id: admin_id.to_string(),
            balance_after: row.balance_after(),
        });
        Ok(row)
    }

    /// Change a wallet's status (suspend, freeze, reactivate).
    ///
    /// Reactivating does not credit held commissions by itself; run
    /// `sync_pending_commissions` afterwards.
    pub fn set_wallet_status(
        &mut self,
        agent_code: &str,
        status: WalletStatus,
    ) -> Result<(), EngineError> {
        let from = {
            let wallet = self
                .store
                .wallet(agent_code)
                .ok_or_else(|| EngineError::UnknownAgent(agent_code.to_string()))?;
            wallet.status()
        };
        if from == status {
            return Ok(());
        }

        let seq = self.store.next_seq();
        if let Some(wallet) = self.store.wallet_mut(agent_code) {
            wallet.set_status(status);
        }
        self.events.log(Event::WalletStatusChanged {
            seq,
            agent_code: agent_code.to_string(),
            from,
            to: status,
        });
        Ok(())
    }

    // ========================================================================
    // Withdrawal surface
    // ========================================================================

    /// Create a withdrawal request for an agent
    pub fn request_withdrawal(
        &mut self,
        agent_code: &str,
        amount: i64,
        bank_details: BankDetails,
    ) -> Result<WithdrawalRequest, EngineError> {
        let request = withdrawal::request(&mut self.store, agent_code, amount, bank_details)?;
        self.events.log(Event::WithdrawalRequested {
            seq: request.requested_seq(),
            request_id: request.id().to_string(),
            agent_code: agent_code.to_string(),
            amount,
        });
        Ok(request)
    }

    /// Approve a pending withdrawal request
    pub fn approve_withdrawal(
        &mut self,
        request_id: &str,
        admin_id: &str,
        notes: &str,
    ) -> Result<WithdrawalRequest, EngineError> {
        let request = withdrawal::approve(&mut self.store, request_id, admin_id, notes)?;
        self.events.log(Event::WithdrawalApproved {
            seq: request.processed_seq().unwrap_or_default(),
            request_id: request_id.to_string(),
            admin_id: admin_id.to_string(),
        });
        Ok(request)
    }

    /// Reject a pending withdrawal request
    pub fn reject_withdrawal(
        &mut self,
        request_id: &str,
        admin_id: &str,
        notes: &str,
    ) -> Result<WithdrawalRequest, EngineError> {
        let request = withdrawal::reject(&mut self.store, request_id, admin_id, notes)?;
        self.events.log(Event::WithdrawalRejected {
            seq: request.processed_seq().unwrap_or_default(),
            request_id: request_id.to_string(),
            admin_id: admin_id.to_string(),
        });
        Ok(request)
    }

    /// Pay out an approved withdrawal request, debiting the wallet
    pub fn complete_withdrawal(
        &mut self,
        request_id: &str,
        admin_id: &str,
        proof: &str,
    ) -> Result<CompletionOutcome, EngineError> {
        let outcome = withdrawal::complete(&mut self.store, request_id, admin_id, proof)?;
        if let CompletionOutcome::Completed(row) = &outcome {
            self.events.log(Event::WithdrawalCompleted {
                seq: row.seq(),
                request_id: request_id.to_string(),
                agent_code: row.agent_code().to_string(),
                admin_id: admin_id.to_string(),
                amount: -row.signed_amount(),
                balance_after: row.balance_after(),
            });
        }
        Ok(outcome)
    }

    // ========================================================================
    // Admin surface
    // ========================================================================

    /// Decommission an agent (terminate and freeze, never delete).
    ///
    /// Refuses while the agent has an active downline, outstanding funds,
    /// or open withdrawal requests; see `admin::decommission_agent`.
    pub fn decommission_agent(
        &mut self,
        agent_code: &str,
        admin_id: &str,
        notes: &str,
    ) -> Result<(), EngineError> {
        if notes.trim().is_empty() {
            return Err(EngineError::AuditNoteRequired);
        }

        admin::decommission_agent(&mut self.store, agent_code)?;

        let seq = self.store.next_seq();
        self.events.log(Event::AgentDecommissioned {
            seq,
            agent_code: agent_code.to_string(),
            admin_id: admin_id.to_string(),
            notes: notes.to_string(),
        });
        Ok(())
    }
}
