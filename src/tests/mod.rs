mod properties;

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::constants::SHARE_TOLERANCE;
use crate::group::ExpenseGroup;
use crate::models::{GroupId, MemberId};

pub const ALICE: MemberId = MemberId(1);
pub const BOB: MemberId = MemberId(2);
pub const CAROL: MemberId = MemberId(3);

/// A fresh group with Alice, Bob and Carol registered.
pub fn test_group() -> ExpenseGroup {
    let _ = env_logger::try_init();
    let mut group = ExpenseGroup::new(GroupId(-1001));
    group.register_member(ALICE).unwrap();
    group.register_member(BOB).unwrap();
    group.register_member(CAROL).unwrap();
    group
}

pub fn names() -> HashMap<MemberId, String> {
    HashMap::from([
        (ALICE, "Alice".to_string()),
        (BOB, "Bob".to_string()),
        (CAROL, "Carol".to_string()),
    ])
}

/// The matrix must sum to zero and mirrored cells must cancel after every
/// operation, no matter what the operation was.
pub fn assert_ledger_invariants(group: &ExpenseGroup) {
    let ledger = group.ledger();
    let total: Decimal = ledger.cells().map(|(_, _, amount)| amount).sum();
    assert_eq!(total, Decimal::ZERO, "ledger does not sum to zero");
    for (a, b, amount) in ledger.cells() {
        assert_eq!(
            amount,
            -ledger.balance(b, a),
            "ledger[{a:?}][{b:?}] is not mirrored"
        );
    }
}

/// Ledger invariants plus per-bill share conservation. A bill emptied in
/// equal mode keeps its total with nothing booked against it, so it is
/// exempt.
pub fn assert_invariants(group: &ExpenseGroup) {
    assert_ledger_invariants(group);
    for bill in group.bills() {
        if bill.shares.is_empty() && bill.unclaimed.is_zero() {
            continue;
        }
        let shares: Decimal = bill.shares.values().copied().sum();
        let drift = (shares + bill.unclaimed - bill.total).abs();
        assert!(
            drift <= SHARE_TOLERANCE,
            "bill {} shares drifted by {}",
            bill.id,
            drift
        );
    }
}
