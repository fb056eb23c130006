//! Commission rule model
//!
//! A rule binds a (plan, payment frequency, tier) key to a commission rate.
//! Exactly one active rule is expected per key; resolution treats anything
//! else as a configuration error (see the `rules` module).
//!
//! # Money and rates
//!
//! All money values are i64 (cents). Percentage rates are stored as integer
//! basis points (11.11% = 1111 bps) so that round-half-up to the cent is
//! exact integer arithmetic with no float error.

use serde::{Deserialize, Serialize};

/// Premium payment frequency of the underlying policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

/// Commission rate: either a percentage of the basis amount or a fixed
/// amount per payment.
///
/// The variants are mutually exclusive by construction; a rule cannot carry
/// both a percentage and a fixed value.
///
/// # Example
/// ```
/// use commission_ledger_core_rs::models::rule::CommissionRate;
///
/// // 11.11% of 9,000 cents rounds half-up to exactly 1,000 cents
/// let pct = CommissionRate::Percentage { bps: 1111 };
/// assert_eq!(pct.amount_for(9_000), 1_000);
///
/// // Fixed rates ignore the basis amount
/// let fixed = CommissionRate::FixedAmount { amount: 1_000 };
/// assert_eq!(fixed.amount_for(123_456), 1_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommissionRate {
    /// Percentage of the basis amount, in basis points (1111 = 11.11%)
    Percentage { bps: i64 },

    /// Fixed amount in cents, regardless of basis
    FixedAmount { amount: i64 },
}

impl CommissionRate {
    /// Compute the commission amount for a basis amount (cents).
    ///
    /// Percentage rates round half-up to the cent:
    ///
    /// ```text
    /// commission = (basis * bps + 5_000) / 10_000
    /// ```
    ///
    /// Fixed rates return their amount verbatim.
    pub fn amount_for(&self, basis_amount: i64) -> i64 {
        match self {
            CommissionRate::Percentage { bps } => (basis_amount * bps + 5_000) / 10_000,
            CommissionRate::FixedAmount { amount } => *amount,
        }
    }
}

/// A commission rule for one (plan, frequency, tier) key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRule {
    /// Unique rule identifier (UUID)
    id: String,

    /// Plan the rule belongs to
    plan_id: String,

    /// Payment frequency the rule applies to
    frequency: PaymentFrequency,

    /// Chain tier the rule applies to (1..=5; tier 1 is the direct agent)
    tier: u8,

    /// Rate used to compute the commission amount
    rate: CommissionRate,

    /// Only active rules participate in resolution
    is_active: bool,
}

impl CommissionRule {
    /// Create a new active rule.
    ///
    /// # Panics
    /// Panics if `tier` is 0 (tiers are 1-based).
    pub fn new(plan_id: String, frequency: PaymentFrequency, tier: u8, rate: CommissionRate) -> Self {
        assert!(tier >= 1, "tier must be 1-based");
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            plan_id,
            frequency,
            tier,
            rate,
            is_active: true,
        }
    }

    /// Get the rule ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the plan ID
    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    /// Get the payment frequency
    pub fn frequency(&self) -> PaymentFrequency {
        self.frequency
    }

    /// Get the tier (1-based)
    pub fn tier(&self) -> u8 {
        self.tier
    }

    /// Get the rate
    pub fn rate(&self) -> CommissionRate {
        self.rate
    }

    /// Check whether the rule is active
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Deactivate the rule (rules are superseded, never deleted)
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Check whether the rule covers a (plan, frequency, tier) key
    pub fn matches(&self, plan_id: &str, frequency: PaymentFrequency, tier: u8) -> bool {
        self.plan_id == plan_id && self.frequency == frequency && self.tier == tier
    }
}
