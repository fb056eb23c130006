//! Referral graph resolution
//!
//! Walks `referrer_code` pointers upward from a paying agent to produce the
//! ordered upline chain used for commission payout. The chain includes the
//! paying agent itself at position one; position in the returned chain is
//! the commission tier.
//!
//! The graph must be acyclic by construction (registration rejects
//! self-referral and unknown referrers), but the walk is defensive: a code
//! reappearing in the chain under construction is reported as a fatal
//! data-integrity error, never looped on or silently truncated.

use crate::repo::AgentRepo;
use std::collections::HashSet;
use thiserror::Error;

/// Commission payout considers at most this many ancestors.
pub const MAX_COMMISSION_TIERS: usize = 5;

/// Errors from upline resolution
#[derive(Debug, Error, PartialEq)]
pub enum ReferralError {
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("cyclic referral chain: {}", chain.join(" -> "))]
    CyclicReferral { chain: Vec<String> },
}

/// Resolve the ordered upline chain for an agent, nearest first.
///
/// The returned chain starts with the agent itself (tier 1, the direct
/// enrolling agent) and walks upward through referrers. It stops at
/// `max_depth` entries or at an agent without a referrer, whichever comes
/// first; chains shorter than `max_depth` are valid and simply yield fewer
/// tiers.
///
/// A referrer code pointing at a missing agent row terminates the walk as
/// if the chain ended there; a code reappearing in the chain fails with
/// [`ReferralError::CyclicReferral`].
///
/// # Example
///
/// ```rust
/// use commission_ledger_core_rs::models::agent::Agent;
/// use commission_ledger_core_rs::models::state::LedgerState;
/// use commission_ledger_core_rs::referral::resolve_upline;
///
/// let mut state = LedgerState::new();
/// state.register_agent(Agent::new("AG-001".to_string(), None)).unwrap();
/// state.register_agent(Agent::new("AG-002".to_string(), Some("AG-001".to_string()))).unwrap();
/// state.register_agent(Agent::new("AG-003".to_string(), Some("AG-002".to_string()))).unwrap();
///
/// let chain = resolve_upline(&state, "AG-003", 5).unwrap();
/// assert_eq!(chain, vec!["AG-003", "AG-002", "AG-001"]);
/// ```
pub fn resolve_upline<S: AgentRepo>(
    store: &S,
    agent_code: &str,
    max_depth: usize,
) -> Result<Vec<String>, ReferralError> {
    let start = store
        .agent(agent_code)
        .ok_or_else(|| ReferralError::UnknownAgent(agent_code.to_string()))?;

    let mut chain = vec![start.agent_code().to_string()];
    let mut seen: HashSet<String> = chain.iter().cloned().collect();
    let mut current = start;

    while chain.len() < max_depth {
        let parent_code = match current.referrer_code() {
            Some(code) => code,
            None => break,
        };

        if seen.contains(parent_code) {
            let mut cycle = chain.clone();
            cycle.push(parent_code.to_string());
            return Err(ReferralError::CyclicReferral { chain: cycle });
        }

        // A dangling referrer pointer ends the chain like a missing parent
        let parent = match store.agent(parent_code) {
            Some(agent) => agent,
            None => break,
        };

        chain.push(parent.agent_code().to_string());
        seen.insert(parent.agent_code().to_string());
        current = parent;
    }

    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::agent::Agent;
    use crate::models::state::LedgerState;

    fn chain_state(depth: usize) -> LedgerState {
        let mut state = LedgerState::new();
        for i in 0..depth {
            let code = format!("AG-{:03}", i + 1);
            let referrer = if i == 0 {
                None
            } else {
                Some(format!("AG-{:03}", i))
            };
            state.register_agent(Agent::new(code, referrer)).unwrap();
        }
        state
    }

    #[test]
    fn test_full_depth_chain() {
        let state = chain_state(8);

        let chain = resolve_upline(&state, "AG-008", MAX_COMMISSION_TIERS).unwrap();
        assert_eq!(
            chain,
            vec!["AG-008", "AG-007", "AG-006", "AG-005", "AG-004"]
        );
    }

    #[test]
    fn test_short_chain_is_not_an_error() {
        let state = chain_state(2);

        let chain = resolve_upline(&state, "AG-002", MAX_COMMISSION_TIERS).unwrap();
        assert_eq!(chain, vec!["AG-002", "AG-001"]);
    }

    #[test]
    fn test_root_agent_chain_of_one() {
        let state = chain_state(1);

        let chain = resolve_upline(&state, "AG-001", MAX_COMMISSION_TIERS).unwrap();
        assert_eq!(chain, vec!["AG-001"]);
    }

    #[test]
    fn test_unknown_agent() {
        let state = chain_state(1);

        let err = resolve_upline(&state, "AG-404", MAX_COMMISSION_TIERS).unwrap_err();
        assert_eq!(err, ReferralError::UnknownAgent("AG-404".to_string()));
    }

    #[test]
    fn test_cycle_detected() {
        // Registration refuses cycles, so build one behind its back to
        // prove the walk is defensive against corrupted data.
        let mut state = LedgerState::new();
        state
            .register_agent(Agent::new("AG-001".to_string(), None))
            .unwrap();
        state
            .register_agent(Agent::new(
                "AG-002".to_string(),
                Some("AG-001".to_string()),
            ))
            .unwrap();
        // Overwrite the root with a corrupted row pointing back down
        *state.get_agent_mut("AG-001").unwrap() =
            Agent::new("AG-001".to_string(), Some("AG-002".to_string()));

        let err = resolve_upline(&state, "AG-002", MAX_COMMISSION_TIERS).unwrap_err();
        assert_eq!(
            err,
            ReferralError::CyclicReferral {
                chain: vec![
                    "AG-002".to_string(),
                    "AG-001".to_string(),
                    "AG-002".to_string(),
                ],
            }
        );
    }

    #[test]
    fn test_cycle_beyond_cap_is_not_reached() {
        // A cycle further up than max_depth entries never enters the chain
        let mut state = chain_state(6);
        *state.get_agent_mut("AG-001").unwrap() =
            Agent::new("AG-001".to_string(), Some("AG-006".to_string()));

        let chain = resolve_upline(&state, "AG-006", MAX_COMMISSION_TIERS).unwrap();
        assert_eq!(chain.len(), MAX_COMMISSION_TIERS);
    }
}
