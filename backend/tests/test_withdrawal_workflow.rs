//! Withdrawal workflow integration tests
//!
//! Exercises the state machine through the engine surface: request ->
//! approve -> complete with the exact ledger effect, the idempotent
//! re-completion guard, and the insufficient-funds behavior that leaves an
//! approved request approved.

use commission_ledger_core_rs::{
    Agent, BankDetails, CommissionEngine, CommissionRate, CommissionRule, CompletionOutcome,
    EngineError, LedgerState, PaymentEvent, PaymentFrequency, WalletStatus, WithdrawalStatus,
    WorkflowError,
};

fn bank_details() -> BankDetails {
    BankDetails {
        bank_name: "First Coop Bank".to_string(),
        account_name: "Maria Santos".to_string(),
        account_number: "0001-2345-6789".to_string(),
    }
}

/// Engine with one agent funded through a commission payment
fn funded_engine(balance: i64) -> CommissionEngine<LedgerState> {
    let mut state = LedgerState::new();
    state
        .register_agent(Agent::new("AG-001".to_string(), None))
        .unwrap();
    state.add_rule(CommissionRule::new(
        "PLAN_A".to_string(),
        PaymentFrequency::Monthly,
        1,
        CommissionRate::FixedAmount { amount: balance },
    ));
    let mut engine = CommissionEngine::new(state);
    if balance > 0 {
        engine
            .on_payment_completed(PaymentEvent {
                payment_reference: "PAY-SEED".to_string(),
                paying_agent_code: "AG-001".to_string(),
                plan_id: "PLAN_A".to_string(),
                basis_amount: balance,
                frequency: PaymentFrequency::Monthly,
            })
            .unwrap();
    }
    engine
}

#[test]
fn test_full_lifecycle_with_exact_amounts() {
    let mut engine = funded_engine(150_000);

    let request = engine
        .request_withdrawal("AG-001", 50_000, bank_details())
        .unwrap();
    assert_eq!(request.status(), WithdrawalStatus::Pending);

    let request = engine
        .approve_withdrawal(request.id(), "admin-1", "bank account verified")
        .unwrap();
    assert_eq!(request.status(), WithdrawalStatus::Approved);
    // Approval has no ledger effect
    assert_eq!(engine.get_wallet("AG-001").unwrap().balance, 150_000);

    let outcome = engine
        .complete_withdrawal(request.id(), "admin-1", "bank-ref-2024-001")
        .unwrap();
    let row = match outcome {
        CompletionOutcome::Completed(row) => row,
        other => panic!("expected completion, got {:?}", other),
    };

    assert_eq!(row.balance_before(), 150_000);
    assert_eq!(row.balance_after(), 100_000);

    let wallet = engine.get_wallet("AG-001").unwrap();
    assert_eq!(wallet.balance, 100_000);
    assert_eq!(wallet.total_withdrawn, 50_000);

    let snapshot = engine.checkpoint().unwrap();
    let stored = snapshot
        .withdrawals
        .iter()
        .find(|r| r.id() == request.id())
        .unwrap();
    assert_eq!(stored.status(), WithdrawalStatus::Completed);
    assert_eq!(stored.proof_reference(), Some("bank-ref-2024-001"));
    assert_eq!(stored.processed_by(), Some("admin-1"));
}

#[test]
fn test_double_complete_is_a_no_op() {
    let mut engine = funded_engine(150_000);
    let request = engine
        .request_withdrawal("AG-001", 50_000, bank_details())
        .unwrap();
    engine
        .approve_withdrawal(request.id(), "admin-1", "ok")
        .unwrap();
    engine
        .complete_withdrawal(request.id(), "admin-1", "ref-1")
        .unwrap();

    // Admin double-submission must never debit twice
    let outcome = engine
        .complete_withdrawal(request.id(), "admin-1", "ref-1")
        .unwrap();
    assert_eq!(outcome, CompletionOutcome::AlreadyCompleted);
    assert_eq!(engine.get_wallet("AG-001").unwrap().balance, 100_000);
    assert_eq!(
        engine.events().events_of_type("WithdrawalCompleted").len(),
        1
    );
}

#[test]
fn test_insufficient_funds_leaves_request_approved() {
    let mut engine = funded_engine(150_000);
    let request = engine
        .request_withdrawal("AG-001", 120_000, bank_details())
        .unwrap();
    engine
        .approve_withdrawal(request.id(), "admin-1", "ok")
        .unwrap();

    // Another payout drains the balance before completion
    let other = engine
        .request_withdrawal("AG-001", 100_000, bank_details())
        .unwrap();
    engine.approve_withdrawal(other.id(), "admin-1", "ok").unwrap();
    engine
        .complete_withdrawal(other.id(), "admin-1", "ref-other")
        .unwrap();
    assert_eq!(engine.get_wallet("AG-001").unwrap().balance, 50_000);

    let err = engine
        .complete_withdrawal(request.id(), "admin-1", "ref-1")
        .unwrap_err();
    assert!(matches!(err, EngineError::Withdrawal(WorkflowError::Ledger(_))));

    // The request is still approved: not completed, not demoted to pending
    let snapshot = engine.checkpoint().unwrap();
    let stored = snapshot
        .withdrawals
        .iter()
        .find(|r| r.id() == request.id())
        .unwrap();
    assert_eq!(stored.status(), WithdrawalStatus::Approved);
    assert_eq!(engine.get_wallet("AG-001").unwrap().balance, 50_000);
}

#[test]
fn test_reject_is_terminal() {
    let mut engine = funded_engine(150_000);
    let request = engine
        .request_withdrawal("AG-001", 50_000, bank_details())
        .unwrap();

    let request = engine
        .reject_withdrawal(request.id(), "admin-1", "account name mismatch")
        .unwrap();
    assert_eq!(request.status(), WithdrawalStatus::Rejected);
    assert_eq!(request.admin_notes(), Some("account name mismatch"));

    let err = engine
        .approve_withdrawal(request.id(), "admin-1", "changed my mind")
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Withdrawal(WorkflowError::Transition(_))
    ));
    let err = engine
        .complete_withdrawal(request.id(), "admin-1", "ref-1")
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Withdrawal(WorkflowError::Transition(_))
    ));
}

#[test]
fn test_pending_request_cannot_complete() {
    let mut engine = funded_engine(150_000);
    let request = engine
        .request_withdrawal("AG-001", 50_000, bank_details())
        .unwrap();

    let err = engine
        .complete_withdrawal(request.id(), "admin-1", "ref-1")
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Withdrawal(WorkflowError::Transition(_))
    ));
    assert_eq!(engine.get_wallet("AG-001").unwrap().balance, 150_000);
}

#[test]
fn test_request_against_non_active_wallet_rejected() {
    let mut engine = funded_engine(150_000);
    engine
        .set_wallet_status("AG-001", WalletStatus::Frozen)
        .unwrap();

    let err = engine
        .request_withdrawal("AG-001", 50_000, bank_details())
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Withdrawal(WorkflowError::Ledger(_))
    ));
}

#[test]
fn test_request_amount_must_be_positive() {
    let mut engine = funded_engine(150_000);

    let err = engine
        .request_withdrawal("AG-001", 0, bank_details())
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Withdrawal(WorkflowError::NonPositiveAmount(0))
    );
}

#[test]
fn test_withdrawal_events_are_logged() {
    let mut engine = funded_engine(150_000);
    let request = engine
        .request_withdrawal("AG-001", 50_000, bank_details())
        .unwrap();
    engine
        .approve_withdrawal(request.id(), "admin-1", "ok")
        .unwrap();
    engine
        .complete_withdrawal(request.id(), "admin-1", "ref-1")
        .unwrap();

    let events = engine.events();
    assert_eq!(events.events_of_type("WithdrawalRequested").len(), 1);
    assert_eq!(events.events_of_type("WithdrawalApproved").len(), 1);
    assert_eq!(events.events_of_type("WithdrawalCompleted").len(), 1);
}
