//! Domain models for the commission and wallet ledger

pub mod agent;
pub mod commission;
pub mod event;
pub mod rule;
pub mod state;
pub mod wallet;
pub mod withdrawal;

// Re-exports
pub use agent::{Agent, AgentStatus};
pub use commission::{CommissionError, CommissionStatus, CommissionTransaction};
pub use event::{Event, EventLog};
pub use rule::{CommissionRate, CommissionRule, PaymentFrequency};
pub use state::{LedgerState, StateError};
pub use wallet::{
    TxLink, Wallet, WalletError, WalletStatus, WalletTransaction, WalletTxKind, WalletTxStatus,
};
pub use withdrawal::{BankDetails, WithdrawalError, WithdrawalRequest, WithdrawalStatus};
