//! Commission rule resolution
//!
//! Looks up the single active rule for a (plan, frequency, tier) key.
//! Exactly one active rule must exist per key. Zero matches and multiple
//! matches are both configuration errors: the affected tier is skipped and
//! the problem is surfaced to operators through a `TierSkipped` event. A
//! rate is never guessed.

use crate::models::rule::{CommissionRule, PaymentFrequency};
use crate::repo::RuleRepo;
use thiserror::Error;

/// Errors from rule resolution
#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("no active commission rule for plan {plan_id}, {frequency:?}, tier {tier}")]
    NoActiveRule {
        plan_id: String,
        frequency: PaymentFrequency,
        tier: u8,
    },

    #[error(
        "{count} active commission rules for plan {plan_id}, {frequency:?}, tier {tier}; \
         rule configuration must be corrected by an operator"
    )]
    AmbiguousRule {
        plan_id: String,
        frequency: PaymentFrequency,
        tier: u8,
        count: usize,
    },
}

/// Resolve the active rule for a (plan, frequency, tier) key.
///
/// Returns a clone of the matched rule so the caller holds a stable copy of
/// the configuration the commission was computed under.
pub fn resolve<S: RuleRepo>(
    store: &S,
    plan_id: &str,
    frequency: PaymentFrequency,
    tier: u8,
) -> Result<CommissionRule, RuleError> {
    let matches = store.active_rules_for(plan_id, frequency, tier);
    match matches.len() {
        0 => Err(RuleError::NoActiveRule {
            plan_id: plan_id.to_string(),
            frequency,
            tier,
        }),
        1 => Ok(matches[0].clone()),
        count => Err(RuleError::AmbiguousRule {
            plan_id: plan_id.to_string(),
            frequency,
            tier,
            count,
        }),
    }
}
