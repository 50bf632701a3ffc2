use vidgen_core::{CostLedger, SessionCost, COST_PER_CALL};

fn session(calls: u32) -> SessionCost {
    let mut cost = SessionCost::default();
    for _ in 0..calls {
        cost.charge_call();
    }
    cost
}

#[test]
fn records_sessions_and_totals() {
    let mut ledger = CostLedger::new();
    assert!(ledger.record_session(session(3), 1_700_000_000_000));
    assert!(ledger.record_session(session(1), 1_700_000_005_000));

    assert_eq!(ledger.entries().len(), 2);
    assert_eq!(ledger.total(), 4 * COST_PER_CALL);
    assert_eq!(ledger.total_calls(), 4);

    let first = &ledger.entries()[0];
    assert_eq!(first.id, "session-1700000000000");
    assert_eq!(first.description, "Video generation (3 API calls)");
}

#[test]
fn empty_sessions_are_not_recorded() {
    let mut ledger = CostLedger::new();
    assert!(!ledger.record_session(SessionCost::default(), 1));
    assert!(ledger.entries().is_empty());
}

#[test]
fn clear_resets_totals() {
    let mut ledger = CostLedger::new();
    ledger.record_session(session(2), 10);
    ledger.clear();
    assert_eq!(ledger.total(), 0);
    assert!(ledger.entries().is_empty());
}
