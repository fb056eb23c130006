//! Event logging for auditing and operator visibility.
//!
//! Every significant state change in the engine is captured as an Event and
//! appended to the EventLog. The log enables:
//! - Auditing (who credited what, and why)
//! - Operator warnings (skipped tiers, duplicate payment deliveries)
//! - Debugging (reconstruct what happened in sequence order)
//!
//! Configuration problems such as a missing or ambiguous commission rule do
//! not abort a payment; they surface here as `TierSkipped` events that an
//! operator is expected to review.
//!
//! # Example
//!
//! ```rust
//! use commission_ledger_core_rs::models::event::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::TierSkipped {
//!     seq: 3,
//!     payment_reference: "PAY-0001".to_string(),
//!     tier: 4,
//!     reason: "no active commission rule".to_string(),
//! });
//!
//! assert_eq!(log.events_of_type("TierSkipped").len(), 1);
//! ```

use crate::models::wallet::WalletStatus;

/// Engine event capturing a state change or operator-visible warning.
///
/// All events include the store sequence number of the mutation they
/// describe, giving a total audit ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A commission was created and credited to the earner's wallet
    CommissionPosted {
        seq: u64,
        payment_reference: String,
        commission_id: String,
        earner_code: String,
        tier: u8,
        amount: i64,
    },

    /// A commission was created but held because the earner's wallet was
    /// not active
    CommissionHeld {
        seq: u64,
        payment_reference: String,
        commission_id: String,
        earner_code: String,
        tier: u8,
        amount: i64,
        wallet_status: WalletStatus,
    },

    /// A tier was skipped because its rule configuration was missing or
    /// ambiguous; operators must review these
    TierSkipped {
        seq: u64,
        payment_reference: String,
        tier: u8,
        reason: String,
    },

    /// A payment event arrived for a reference that was already processed;
    /// the prior result was returned unchanged
    DuplicatePayment {
        seq: u64,
        payment_reference: String,
        existing: usize,
    },

    /// A wallet was credited
    WalletCredited {
        seq: u64,
        agent_code: String,
        tx_id: String,
        amount: i64,
        balance_after: i64,
    },

    /// A wallet was debited
    WalletDebited {
        seq: u64,
        agent_code: String,
        tx_id: String,
        amount: i64,
        balance_after: i64,
    },

    /// An admin corrected a wallet balance
    BalanceAdjusted {
        seq: u64,
        agent_code: String,
        tx_id: String,
        delta: i64,
        admin_id: String,
        balance_after: i64,
    },

    /// A held commission was credited after its wallet returned to active
    PendingCommissionSynced {
        seq: u64,
        commission_id: String,
        earner_code: String,
        amount: i64,
    },

    /// A posted commission was backed out with an offsetting debit
    CommissionReversed {
        seq: u64,
        commission_id: String,
        earner_code: String,
        amount: i64,
        admin_id: String,
    },

    /// An agent requested a withdrawal
    WithdrawalRequested {
        seq: u64,
        request_id: String,
        agent_code: String,
        amount: i64,
    },

    /// An admin approved a withdrawal request
    WithdrawalApproved {
        seq: u64,
        request_id: String,
        admin_id: String,
    },

    /// An admin rejected a withdrawal request
    WithdrawalRejected {
        seq: u64,
        request_id: String,
        admin_id: String,
    },

    /// An approved withdrawal was paid out and debited
    WithdrawalCompleted {
        seq: u64,
        request_id: String,
        agent_code: String,
        admin_id: String,
        amount: i64,
        balance_after: i64,
    },

    /// A wallet's status changed
    WalletStatusChanged {
        seq: u64,
        agent_code: String,
        from: WalletStatus,
        to: WalletStatus,
    },

    /// An agent was decommissioned (terminated, wallet frozen)
    AgentDecommissioned {
        seq: u64,
        agent_code: String,
        admin_id: String,
        notes: String,
    },
}

impl Event {
    /// Get the sequence number of the mutation this event describes
    pub fn seq(&self) -> u64 {
        match self {
            Event::CommissionPosted { seq, .. } => *seq,
            Event::CommissionHeld { seq, .. } => *seq,
            Event::TierSkipped { seq, .. } => *seq,
            Event::DuplicatePayment { seq, .. } => *seq,
            Event::WalletCredited { seq, .. } => *seq,
            Event::WalletDebited { seq, .. } => *seq,
            Event::BalanceAdjusted { seq, .. } => *seq,
            Event::PendingCommissionSynced { seq, .. } => *seq,
            Event::CommissionReversed { seq, .. } => *seq,
            Event::WithdrawalRequested { seq, .. } => *seq,
            Event::WithdrawalApproved { seq, .. } => *seq,
            Event::WithdrawalRejected { seq, .. } => *seq,
            Event::WithdrawalCompleted { seq, .. } => *seq,
            Event::WalletStatusChanged { seq, .. } => *seq,
            Event::AgentDecommissioned { seq, .. } => *seq,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::CommissionPosted { .. } => "CommissionPosted",
            Event::CommissionHeld { .. } => "CommissionHeld",
            Event::TierSkipped { .. } => "TierSkipped",
            Event::DuplicatePayment { .. } => "DuplicatePayment",
            Event::WalletCredited { .. } => "WalletCredited",
            Event::WalletDebited { .. } => "WalletDebited",
            Event::BalanceAdjusted { .. } => "BalanceAdjusted",
            Event::PendingCommissionSynced { .. } => "PendingCommissionSynced",
            Event::CommissionReversed { .. } => "CommissionReversed",
            Event::WithdrawalRequested { .. } => "WithdrawalRequested",
            Event::WithdrawalApproved { .. } => "WithdrawalApproved",
            Event::WithdrawalRejected { .. } => "WithdrawalRejected",
            Event::WithdrawalCompleted { .. } => "WithdrawalCompleted",
            Event::WalletStatusChanged { .. } => "WalletStatusChanged",
            Event::AgentDecommissioned { .. } => "AgentDecommissioned",
        }
    }

    /// Get the agent code if the event relates to a specific agent
    pub fn agent_code(&self) -> Option<&str> {
        match self {
            Event::CommissionPosted { earner_code, .. } => Some(earner_code),
            Event::CommissionHeld { earner_code, .. } => Some(earner_code),
            Event::WalletCredited { agent_code, .. } => Some(agent_code),
            Event::WalletDebited { agent_code, .. } => Some(agent_code),
            Event::BalanceAdjusted { agent_code, .. } => Some(agent_code),
            Event::PendingCommissionSynced { earner_code, .. } => Some(earner_code),
            Event::CommissionReversed { earner_code, .. } => Some(earner_code),
            Event::WithdrawalRequested { agent_code, .. } => Some(agent_code),
            Event::WithdrawalCompleted { agent_code, .. } => Some(agent_code),
            Event::WalletStatusChanged { agent_code, .. } => Some(agent_code),
            Event::AgentDecommissioned { agent_code, .. } => Some(agent_code),
            _ => None,
        }
    }

    /// Get the payment reference if the event relates to a payment event
    pub fn payment_reference(&self) -> Option<&str> {
        match self {
            Event::CommissionPosted { payment_reference, .. } => Some(payment_reference),
            Event::CommissionHeld { payment_reference, .. } => Some(payment_reference),
            Event::TierSkipped { payment_reference, .. } => Some(payment_reference),
            Event::DuplicatePayment { payment_reference, .. } => Some(payment_reference),
            _ => None,
        }
    }
}

/// Event log for storing and querying engine events.
///
/// This is a simple wrapper around Vec<Event> with convenience methods.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Get the number of events logged
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events for a specific agent
    pub fn events_for_agent(&self, agent_code: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.agent_code() == Some(agent_code))
            .collect()
    }

    /// Get events for a specific payment reference
    pub fn events_for_payment(&self, payment_reference: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.payment_reference() == Some(payment_reference))
            .collect()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
