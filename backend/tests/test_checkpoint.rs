//! Checkpoint integration tests
//!
//! Round-trips a working ledger through a snapshot and verifies the hash
//! and invariant validation reject anything inconsistent.

use commission_ledger_core_rs::commission::checkpoint::{
    compute_state_hash, restore_snapshot, take_snapshot, validate_snapshot, CheckpointError,
};
use commission_ledger_core_rs::{
    Agent, BankDetails, CommissionEngine, CommissionRate, CommissionRule, LedgerState,
    PaymentEvent, PaymentFrequency, Wallet, WalletStatus,
};

fn working_engine() -> CommissionEngine<LedgerState> {
    let mut state = LedgerState::new();
    for (code, referrer) in [("AG-001", None), ("AG-002", Some("AG-001"))] {
        state
            .register_agent(Agent::new(
                code.to_string(),
                referrer.map(|s: &str| s.to_string()),
            ))
            .unwrap();
    }
    for (tier, bps) in [(1u8, 1000i64), (2, 500)] {
        state.add_rule(CommissionRule::new(
            "PLAN_A".to_string(),
            PaymentFrequency::Monthly,
            tier,
            CommissionRate::Percentage { bps },
        ));
    }

    let mut engine = CommissionEngine::new(state);
    engine
        .on_payment_completed(PaymentEvent {
            payment_reference: "PAY-0001".to_string(),
            paying_agent_code: "AG-002".to_string(),
            plan_id: "PLAN_A".to_string(),
            basis_amount: 100_000,
            frequency: PaymentFrequency::Monthly,
        })
        .unwrap();

    let request = engine
        .request_withdrawal(
            "AG-002",
            4_000,
            BankDetails {
                bank_name: "First Coop Bank".to_string(),
                account_name: "Test Agent".to_string(),
                account_number: "0001".to_string(),
            },
        )
        .unwrap();
    engine
        .approve_withdrawal(request.id(), "admin-1", "ok")
        .unwrap();
    engine
        .complete_withdrawal(request.id(), "admin-1", "ref-1")
        .unwrap();

    engine
}

#[test]
fn test_round_trip_preserves_everything() {
    let engine = working_engine();
    let snapshot = engine.checkpoint().unwrap();

    let restored = CommissionEngine::restore(snapshot.clone()).unwrap();

    assert_eq!(restored.get_wallet("AG-002").unwrap().balance, 6_000);
    assert_eq!(restored.get_wallet("AG-002").unwrap().total_withdrawn, 4_000);
    assert_eq!(restored.get_wallet("AG-001").unwrap().balance, 5_000);

    // A restored engine produces an identical snapshot
    let again = restored.checkpoint().unwrap();
    assert_eq!(again.state_hash, snapshot.state_hash);

    // The sequence counter carries over, so audit ordering continues
    assert_eq!(again.seq, snapshot.seq);
}

#[test]
fn test_restored_engine_keeps_idempotency() {
    let engine = working_engine();
    let snapshot = engine.checkpoint().unwrap();
    let mut restored = CommissionEngine::restore(snapshot).unwrap();

    // Re-delivering the processed payment is still a no-op after restore
    let created = restored
        .on_payment_completed(PaymentEvent {
            payment_reference: "PAY-0001".to_string(),
            paying_agent_code: "AG-002".to_string(),
            plan_id: "PLAN_A".to_string(),
            basis_amount: 100_000,
            frequency: PaymentFrequency::Monthly,
        })
        .unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(restored.get_wallet("AG-002").unwrap().balance, 6_000);
}

#[test]
fn test_held_commissions_survive_restore() {
    let mut engine = working_engine();
    engine
        .set_wallet_status("AG-001", WalletStatus::Suspended)
        .unwrap();
    engine
        .on_payment_completed(PaymentEvent {
            payment_reference: "PAY-0002".to_string(),
            paying_agent_code: "AG-002".to_string(),
            plan_id: "PLAN_A".to_string(),
            basis_amount: 100_000,
            frequency: PaymentFrequency::Monthly,
        })
        .unwrap();
    assert_eq!(engine.get_wallet("AG-001").unwrap().pending_commission, 5_000);

    let snapshot = engine.checkpoint().unwrap();
    let mut restored = CommissionEngine::restore(snapshot).unwrap();

    restored
        .set_wallet_status("AG-001", WalletStatus::Active)
        .unwrap();
    assert_eq!(restored.sync_pending_commissions(Some("AG-001")).unwrap(), 1);
    assert_eq!(restored.get_wallet("AG-001").unwrap().balance, 10_000);
}

#[test]
fn test_tampered_hash_is_rejected() {
    let engine = working_engine();
    let mut snapshot = engine.checkpoint().unwrap();
    snapshot.seq += 100;

    let err = restore_snapshot(snapshot).unwrap_err();
    assert!(matches!(err, CheckpointError::HashMismatch { .. }));
}

#[test]
fn test_broken_balance_invariant_is_rejected() {
    let engine = working_engine();
    let mut snapshot = engine.checkpoint().unwrap();

    // Corrupt a cached balance, then re-hash so only validation can catch it
    let wallet = snapshot
        .wallets
        .iter_mut()
        .find(|w| w.agent_code() == "AG-001")
        .unwrap();
    *wallet = Wallet::from_snapshot(
        "AG-001".to_string(),
        wallet.balance() + 1,
        wallet.total_earned(),
        wallet.total_withdrawn(),
        wallet.pending_commission(),
        wallet.status(),
    );
    snapshot.state_hash = compute_state_hash(&snapshot).unwrap();

    let err = restore_snapshot(snapshot).unwrap_err();
    assert!(matches!(err, CheckpointError::Validation(_)));
}

#[test]
fn test_orphan_wallet_is_rejected() {
    let state = LedgerState::new();
    let mut snapshot = take_snapshot(&state).unwrap();
    snapshot.wallets.push(Wallet::new("AG-404".to_string()));
    snapshot.state_hash = compute_state_hash(&snapshot).unwrap();

    let err = validate_snapshot(&snapshot).unwrap_err();
    assert!(matches!(err, CheckpointError::Validation(_)));
}
