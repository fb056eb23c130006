//! Referral graph and rule resolution integration tests

use commission_ledger_core_rs::{
    resolve_upline, Agent, AgentStatus, CommissionRate, CommissionRule, LedgerState,
    PaymentFrequency, ReferralError, RuleError, MAX_COMMISSION_TIERS,
};

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

// ============================================================================
// Referral graph
// ============================================================================

#[test]
fn test_upline_is_nearest_first() {
    let state = chain_state(4);

    let chain = resolve_upline(&state, "AG-004", MAX_COMMISSION_TIERS).unwrap();
    assert_eq!(chain, vec!["AG-004", "AG-003", "AG-002", "AG-001"]);
}

#[test]
fn test_depth_cap_applies() {
    let state = chain_state(10);

    let chain = resolve_upline(&state, "AG-010", MAX_COMMISSION_TIERS).unwrap();
    assert_eq!(chain.len(), 5);
    assert_eq!(chain.last().map(String::as_str), Some("AG-006"));
}

#[test]
fn test_inactive_ancestors_stay_in_the_chain() {
    // Chain membership is structural; agent status only affects how the
    // earner's wallet is treated at payout time.
    let mut state = chain_state(3);
    state
        .get_agent_mut("AG-002")
        .unwrap()
        .set_status(AgentStatus::Suspended);

    let chain = resolve_upline(&state, "AG-003", MAX_COMMISSION_TIERS).unwrap();
    assert_eq!(chain, vec!["AG-003", "AG-002", "AG-001"]);
}

#[test]
fn test_registration_refuses_graph_corruption() {
    let mut state = chain_state(1);

    // Unknown referrer
    assert!(state
        .register_agent(Agent::new("AG-900".to_string(), Some("AG-404".to_string())))
        .is_err());

    // Self-referral
    assert!(state
        .register_agent(Agent::new("AG-901".to_string(), Some("AG-901".to_string())))
        .is_err());
}

#[test]
fn test_corrupted_cycle_is_fatal() {
    let mut state = chain_state(2);
    *state.get_agent_mut("AG-001").unwrap() =
        Agent::new("AG-001".to_string(), Some("AG-002".to_string()));

    let err = resolve_upline(&state, "AG-001", MAX_COMMISSION_TIERS).unwrap_err();
    assert!(matches!(err, ReferralError::CyclicReferral { .. }));
}

// ============================================================================
// Rule resolution
// ============================================================================

fn rule(tier: u8, rate: CommissionRate) -> CommissionRule {
    CommissionRule::new("PLAN_A".to_string(), PaymentFrequency::Monthly, tier, rate)
}

#[test]
fn test_resolution_is_key_exact() {
    let mut state = LedgerState::new();
    state.add_rule(rule(1, CommissionRate::Percentage { bps: 1000 }));

    // Same plan and frequency, different tier
    let err =
        commission_ledger_core_rs::rules::resolve(&state, "PLAN_A", PaymentFrequency::Monthly, 2)
            .unwrap_err();
    assert!(matches!(err, RuleError::NoActiveRule { .. }));

    // Same plan and tier, different frequency
    let err =
        commission_ledger_core_rs::rules::resolve(&state, "PLAN_A", PaymentFrequency::Annual, 1)
            .unwrap_err();
    assert!(matches!(err, RuleError::NoActiveRule { .. }));

    let resolved =
        commission_ledger_core_rs::rules::resolve(&state, "PLAN_A", PaymentFrequency::Monthly, 1)
            .unwrap();
    assert_eq!(resolved.rate(), CommissionRate::Percentage { bps: 1000 });
}

#[test]
fn test_supersede_keeps_one_active_rule() {
    let mut state = LedgerState::new();
    state.add_rule(rule(1, CommissionRate::Percentage { bps: 1000 }));
    state.supersede_rule(rule(1, CommissionRate::Percentage { bps: 1200 }));
    state.supersede_rule(rule(1, CommissionRate::FixedAmount { amount: 2_000 }));

    let resolved =
        commission_ledger_core_rs::rules::resolve(&state, "PLAN_A", PaymentFrequency::Monthly, 1)
            .unwrap();
    assert_eq!(resolved.rate(), CommissionRate::FixedAmount { amount: 2_000 });

    // History is preserved: superseded rules remain, deactivated
    assert_eq!(state.rules().len(), 3);
    assert_eq!(state.rules().iter().filter(|r| r.is_active()).count(), 1);
}

#[test]
fn test_ambiguous_configuration_is_surfaced_not_guessed() {
    let mut state = LedgerState::new();
    state.add_rule(rule(1, CommissionRate::Percentage { bps: 1000 }));
    state.add_rule(rule(1, CommissionRate::FixedAmount { amount: 2_000 }));

    let err =
        commission_ledger_core_rs::rules::resolve(&state, "PLAN_A", PaymentFrequency::Monthly, 1)
            .unwrap_err();
    assert_eq!(
        err,
        RuleError::AmbiguousRule {
            plan_id: "PLAN_A".to_string(),
            frequency: PaymentFrequency::Monthly,
            tier: 1,
            count: 2,
        }
    );
}

#[test]
fn test_rounding_examples() {
    // The documented reference cases for percentage rounding
    let rate = CommissionRate::Percentage { bps: 1111 };
    assert_eq!(rate.amount_for(9_000), 1_000);

    let rate = CommissionRate::FixedAmount { amount: 1_000 };
    assert_eq!(rate.amount_for(9_000), 1_000);
    assert_eq!(rate.amount_for(1), 1_000);
}
