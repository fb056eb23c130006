//! Commission engine - payment processing and the admin surface
//!
//! See `engine.rs` for the payment flow and `checkpoint.rs` for state
//! snapshots.

pub mod checkpoint;
pub mod engine;

// Re-export main types for convenience
pub use checkpoint::{
    compute_state_hash, restore_snapshot, take_snapshot, validate_snapshot, CheckpointError,
    LedgerSnapshot,
};
pub use engine::{CommissionEngine, EngineConfig, EngineError, PaymentEvent, WalletView};
