// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use hearth::db;
use hearth::installments::{plan_installments, split_amount, InstallmentEngine};
use hearth::models::{
    EntryKind, ExpenseDraft, NewCategory, NewEntryType, NewMember, Recurrence, Status,
};
use hearth::store::{EntryFilter, LedgerStore, MemoryStore, SqliteStore};
use hearth::LedgerError;
use proptest::prelude::*;
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

struct Ids {
    member: i64,
    category: i64,
    installment_type: i64,
    one_time_type: i64,
}

fn seed<S: LedgerStore>(store: &mut S) -> Ids {
    let member = store
        .insert_member(&NewMember {
            name: "Ana".into(),
            color: "#3b82f6".into(),
            aggregate_to_family: true,
        })
        .unwrap()
        .id;
    let category = store
        .insert_category(&NewCategory {
            name: "Electronics".into(),
            kind: EntryKind::Expense,
            color: "#8b5cf6".into(),
            description: None,
        })
        .unwrap()
        .id;
    let mut add_type = |name: &str, recurrence| {
        store
            .insert_entry_type(&NewEntryType {
                name: name.into(),
                kind: EntryKind::Expense,
                color: "#64748b".into(),
                description: None,
                recurrence: Some(recurrence),
            })
            .unwrap()
            .id
    };
    let installment_type = add_type("Installment", Recurrence::Installment);
    let one_time_type = add_type("One-time", Recurrence::OneTime);
    Ids {
        member,
        category,
        installment_type,
        one_time_type,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(ids: &Ids, amount: Decimal, installments: Option<u32>) -> ExpenseDraft {
    ExpenseDraft {
        description: "Laptop".into(),
        amount,
        date: date(2024, 1, 31),
        account_id: None,
        member_id: ids.member,
        category_id: ids.category,
        type_id: ids.installment_type,
        status: Status::Pending,
        aggregate_to_family: None,
        installments,
    }
}

fn sqlite() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

#[test]
fn split_puts_rounding_drift_on_last_share() {
    let shares = split_amount(dec!(100.00), 3).unwrap();
    assert_eq!(shares, vec![dec!(33.33), dec!(33.33), dec!(33.34)]);

    let shares = split_amount(dec!(1000.00), 3).unwrap();
    assert_eq!(shares, vec![dec!(333.33), dec!(333.33), dec!(333.34)]);
}

#[test]
fn split_rounds_half_up() {
    // 0.05 / 2 = 0.025 -> 0.03, last takes 0.02
    let shares = split_amount(dec!(0.05), 2).unwrap();
    assert_eq!(shares, vec![dec!(0.03), dec!(0.02)]);
}

#[test]
fn split_rejects_amounts_too_small_to_share() {
    let err = split_amount(dec!(0.01), 2).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[test]
fn split_rejects_fewer_than_two() {
    assert!(matches!(
        split_amount(dec!(10), 1),
        Err(LedgerError::Validation(_))
    ));
    assert!(matches!(
        split_amount(dec!(10), 0),
        Err(LedgerError::Validation(_))
    ));
}

#[test]
fn dates_clamp_to_month_end() {
    let mut store = MemoryStore::new();
    let ids = seed(&mut store);
    let rows = plan_installments(&draft(&ids, dec!(300.00), Some(3)), 3).unwrap();
    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31)]
    );
}

#[test]
fn group_is_linked_to_first_row() {
    let mut store = MemoryStore::new();
    let ids = seed(&mut store);
    let created = InstallmentEngine::new(&mut store)
        .record_expense(&draft(&ids, dec!(1000.00), Some(3)))
        .unwrap();

    assert_eq!(created.len(), 3);
    let parent = created[0].id;
    for (idx, row) in created.iter().enumerate() {
        assert_eq!(row.installment_number, Some(idx as u32 + 1));
        assert_eq!(row.total_installments, Some(3));
        assert_eq!(row.parent_transaction_id, Some(parent));
        assert_eq!(row.member_id, ids.member);
        assert_eq!(row.category_id, ids.category);
        assert_eq!(row.status, Status::Pending);
        assert_eq!(row.recurrence, Some(Recurrence::Installment));
    }
    let total: Decimal = created.iter().map(|r| r.amount).sum();
    assert_eq!(total, dec!(1000.00));
}

#[test]
fn sqlite_group_round_trips_through_store() {
    let conn = sqlite();
    let mut store = SqliteStore::new(&conn);
    let ids = seed(&mut store);
    let created = InstallmentEngine::new(&mut store)
        .record_expense(&draft(&ids, dec!(1000.00), Some(3)))
        .unwrap();

    let parent = created[0].id;
    let stored = store.transactions(&EntryFilter::all()).unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|t| t.parent_transaction_id == Some(parent)));
    assert_eq!(
        stored.iter().map(|t| t.amount).collect::<Vec<_>>(),
        vec![dec!(333.33), dec!(333.33), dec!(333.34)]
    );
    assert_eq!(stored[1].date, date(2024, 2, 29));
}

#[test]
fn single_expense_has_no_installment_metadata() {
    let mut store = MemoryStore::new();
    let ids = seed(&mut store);
    let mut d = draft(&ids, dec!(42.50), None);
    d.type_id = ids.one_time_type;
    d.description = "  Pizza  ".into();

    let created = InstallmentEngine::new(&mut store).record_expense(&d).unwrap();
    assert_eq!(created.len(), 1);
    let row = &created[0];
    assert_eq!(row.description, "Pizza");
    assert_eq!(row.amount, dec!(42.50));
    assert_eq!(row.installment_number, None);
    assert_eq!(row.total_installments, None);
    assert_eq!(row.parent_transaction_id, None);
}

#[test]
fn installments_of_one_on_plain_type_is_single_row() {
    let mut store = MemoryStore::new();
    let ids = seed(&mut store);
    let mut d = draft(&ids, dec!(10), Some(1));
    d.type_id = ids.one_time_type;
    let created = InstallmentEngine::new(&mut store).record_expense(&d).unwrap();
    assert_eq!(created.len(), 1);
    assert!(!created[0].is_installment());
}

#[test]
fn installment_type_needs_at_least_two() {
    let mut store = MemoryStore::new();
    let ids = seed(&mut store);
    for n in [None, Some(0), Some(1)] {
        let err = InstallmentEngine::new(&mut store)
            .record_expense(&draft(&ids, dec!(100), n))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)), "{:?}", n);
    }
    assert_eq!(store.transaction_count(), 0);
}

#[test]
fn installments_on_plain_type_are_rejected() {
    let mut store = MemoryStore::new();
    let ids = seed(&mut store);
    let mut d = draft(&ids, dec!(100), Some(4));
    d.type_id = ids.one_time_type;
    let err = InstallmentEngine::new(&mut store).record_expense(&d).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(store.transaction_count(), 0);
}

#[test]
fn invalid_drafts_write_nothing() {
    let mut store = MemoryStore::new();
    let ids = seed(&mut store);
    let cases = [
        draft(&ids, dec!(0), Some(3)),
        draft(&ids, dec!(-10), Some(3)),
        draft(&ids, dec!(10.005), Some(3)),
        ExpenseDraft {
            description: "   ".into(),
            ..draft(&ids, dec!(10), Some(3))
        },
        ExpenseDraft {
            member_id: 999,
            ..draft(&ids, dec!(10), Some(3))
        },
        ExpenseDraft {
            account_id: Some(999),
            ..draft(&ids, dec!(10), Some(3))
        },
    ];
    for d in &cases {
        let err = InstallmentEngine::new(&mut store).record_expense(d).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)), "{:?}", d);
    }
    assert_eq!(store.transaction_count(), 0);
}

#[test]
fn amounts_beyond_twelve_digits_are_rejected() {
    let mut store = MemoryStore::new();
    let ids = seed(&mut store);
    let huge = dec!(50000000000000000000000000000);
    for d in [
        draft(&ids, huge, Some(3)),
        draft(&ids, dec!(10000000000.00), Some(2)),
        ExpenseDraft {
            type_id: ids.one_time_type,
            ..draft(&ids, huge, None)
        },
    ] {
        let err = InstallmentEngine::new(&mut store).record_expense(&d).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)), "{:?}", d.amount);
    }
    assert_eq!(store.transaction_count(), 0);

    let created = InstallmentEngine::new(&mut store)
        .record_expense(&draft(&ids, dec!(9999999999.99), Some(3)))
        .unwrap();
    let total: Decimal = created.iter().map(|r| r.amount).sum();
    assert_eq!(total, dec!(9999999999.99));
}

#[test]
fn income_category_is_rejected_for_expense() {
    let mut store = MemoryStore::new();
    let ids = seed(&mut store);
    let salary = store
        .insert_category(&NewCategory {
            name: "Salary".into(),
            kind: EntryKind::Income,
            color: "#22c55e".into(),
            description: None,
        })
        .unwrap()
        .id;
    let d = ExpenseDraft {
        category_id: salary,
        ..draft(&ids, dec!(100), Some(2))
    };
    let err = InstallmentEngine::new(&mut store).record_expense(&d).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[test]
fn failed_batch_leaves_no_rows_in_memory() {
    let mut store = MemoryStore::new();
    let ids = seed(&mut store);
    store.fail_on_insert(3);
    let err = InstallmentEngine::new(&mut store)
        .record_expense(&draft(&ids, dec!(500), Some(5)))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Persistence(_)));
    assert_eq!(store.transaction_count(), 0);

    // The injected fault is one-shot; a retry succeeds.
    let created = InstallmentEngine::new(&mut store)
        .record_expense(&draft(&ids, dec!(500), Some(5)))
        .unwrap();
    assert_eq!(created.len(), 5);
}

#[test]
fn failed_batch_rolls_back_in_sqlite() {
    let conn = sqlite();
    conn.execute_batch(
        "CREATE TRIGGER fail_third BEFORE INSERT ON transactions
         WHEN NEW.installment_number = 3
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .unwrap();
    let mut store = SqliteStore::new(&conn);
    let ids = seed(&mut store);

    let err = InstallmentEngine::new(&mut store)
        .record_expense(&draft(&ids, dec!(500), Some(5)))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Persistence(_)));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn shares_sum_to_total(cents in 5_000i64..10_000_000, n in 2u32..=48) {
        let total = Decimal::new(cents, 2);
        let shares = split_amount(total, n).unwrap();
        prop_assert_eq!(shares.len(), n as usize);
        prop_assert_eq!(shares.iter().copied().sum::<Decimal>(), total);
        prop_assert!(shares.iter().all(|s| *s > Decimal::ZERO && s.scale() <= 2));
        let first = shares[0];
        prop_assert!(shares[..shares.len() - 1].iter().all(|s| *s == first));
    }

    #[test]
    fn planned_rows_follow_calendar(cents in 5_000i64..1_000_000, n in 2u32..=48) {
        let mut store = MemoryStore::new();
        let ids = seed(&mut store);
        let rows = plan_installments(&draft(&ids, Decimal::new(cents, 2), Some(n)), n).unwrap();
        prop_assert_eq!(rows.len(), n as usize);
        for pair in rows.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
        for (idx, row) in rows.iter().enumerate() {
            prop_assert_eq!(row.installment_number, Some(idx as u32 + 1));
            prop_assert_eq!(row.total_installments, Some(n));
        }
    }
}
