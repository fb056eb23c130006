//! Commission Ledger Core - Agent Network Engine
//!
//! Commission computation and wallet ledger engine for an insurance-agent
//! network. Given a completed premium payment, the engine walks the paying
//! agent's referral chain, computes per-tier commissions under
//! plan-specific rules, posts immutable ledger entries, and keeps cached
//! wallet balances consistent, with idempotent payment processing and an
//! admin-driven withdrawal workflow debiting the same ledger.
//!
//! # Architecture
//!
//! - **models**: Domain types (Agent, CommissionRule, CommissionTransaction,
//!   Wallet, WithdrawalRequest, LedgerState, EventLog)
//! - **repo**: Repository traits, the persistence seam per entity
//! - **referral**: Upline chain resolution with cycle detection
//! - **rules**: Commission rule resolution (exactly one active rule per key)
//! - **ledger**: The only component allowed to mutate wallet balances
//! - **withdrawal**: Withdrawal request state machine
//! - **admin**: Auditable agent decommissioning
//! - **commission**: The engine orchestrating all of the above, plus
//!   checkpointing
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 (cents)
//! 2. Every wallet balance equals the sum of signed amounts of its
//!    Completed wallet transactions
//! 3. One commission transaction per (payment_reference, tier); duplicate
//!    payment deliveries are idempotent no-ops

// Module declarations
pub mod admin;
pub mod commission;
pub mod ledger;
pub mod models;
pub mod referral;
pub mod repo;
pub mod rules;
pub mod withdrawal;

// Re-exports for convenience
pub use admin::AdminError;
pub use commission::{
    CommissionEngine, EngineConfig, EngineError, LedgerSnapshot, PaymentEvent, WalletView,
};
pub use ledger::LedgerError;
pub use models::{
    agent::{Agent, AgentStatus},
    commission::{CommissionStatus, CommissionTransaction},
    event::{Event, EventLog},
    rule::{CommissionRate, CommissionRule, PaymentFrequency},
    state::{LedgerState, StateError},
    wallet::{TxLink, Wallet, WalletStatus, WalletTransaction, WalletTxKind, WalletTxStatus},
    withdrawal::{BankDetails, WithdrawalRequest, WithdrawalStatus},
};
pub use referral::{resolve_upline, ReferralError, MAX_COMMISSION_TIERS};
pub use repo::{
    AgentRepo, CommissionRepo, RuleRepo, SequenceSource, WalletRepo, WithdrawalRepo,
};
pub use rules::RuleError;
pub use withdrawal::{CompletionOutcome, WorkflowError};
