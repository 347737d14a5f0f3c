// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use hearth::aggregate::period_totals;
use hearth::db;
use hearth::installments::InstallmentEngine;
use hearth::ledger;
use hearth::models::{
    AccountKind, EntryKind, ExpenseDraft, NewAccount, NewCategory, NewMember,
    NewMovement, Period, Recurrence, Status,
};
use hearth::store::{EntryFilter, LedgerStore, SqliteStore};
use hearth::LedgerError;
use rusqlite::{params, Connection};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    db::seed_defaults(&mut conn).unwrap();
    conn
}

struct Fixture {
    checking: i64,
    ana: i64,
    bruno: i64,
    food: i64,
    fixed: i64,
    installment: i64,
}

fn fixture(store: &mut SqliteStore<'_>) -> Fixture {
    let checking = store
        .insert_account(&NewAccount {
            name: "Checking".into(),
            kind: AccountKind::Checking,
            initial_balance: dec!(100),
        })
        .unwrap()
        .id;
    let ana = store
        .insert_member(&NewMember {
            name: "Ana".into(),
            color: "#3b82f6".into(),
            aggregate_to_family: true,
        })
        .unwrap()
        .id;
    let bruno = store
        .insert_member(&NewMember {
            name: "Bruno".into(),
            color: "#f97316".into(),
            aggregate_to_family: false,
        })
        .unwrap()
        .id;
    let food = store
        .insert_category(&NewCategory {
            name: "Dining".into(),
            kind: EntryKind::Expense,
            color: "#ef4444".into(),
            description: Some("Restaurants".into()),
        })
        .unwrap()
        .id;
    let types = store.entry_types(Some(EntryKind::Expense)).unwrap();
    let by_recurrence = |r| types.iter().find(|t| t.recurrence == Some(r)).unwrap().id;
    Fixture {
        checking,
        ana,
        bruno,
        food,
        fixed: by_recurrence(Recurrence::Fixed),
        installment: by_recurrence(Recurrence::Installment),
    }
}

fn expense(f: &Fixture, amount: rust_decimal::Decimal, on: NaiveDate) -> ExpenseDraft {
    ExpenseDraft {
        description: "Dinner".into(),
        amount,
        date: on,
        account_id: Some(f.checking),
        member_id: f.ana,
        category_id: f.food,
        type_id: f.fixed,
        status: Status::Pending,
        aggregate_to_family: None,
        installments: None,
    }
}

#[test]
fn seed_defaults_is_idempotent() {
    let mut conn = setup();
    assert_eq!(db::seed_defaults(&mut conn).unwrap(), 0);
    let store = SqliteStore::new(&conn);
    let types = store.entry_types(Some(EntryKind::Expense)).unwrap();
    assert!(types
        .iter()
        .any(|t| t.recurrence == Some(Recurrence::Installment)));
    assert!(!store.categories(Some(EntryKind::Income)).unwrap().is_empty());
}

#[test]
fn filters_combine_with_and() {
    let conn = setup();
    let mut store = SqliteStore::new(&conn);
    let f = fixture(&mut store);
    let mut engine = InstallmentEngine::new(&mut store);
    engine.record_expense(&expense(&f, dec!(10), date(2024, 3, 1))).unwrap();
    engine
        .record_expense(&ExpenseDraft {
            member_id: f.bruno,
            ..expense(&f, dec!(20), date(2024, 3, 2))
        })
        .unwrap();
    engine
        .record_expense(&ExpenseDraft {
            status: Status::Paid,
            ..expense(&f, dec!(30), date(2024, 4, 2))
        })
        .unwrap();

    let march = Period::month(2024, 3).unwrap();
    assert_eq!(store.transactions(&EntryFilter::all()).unwrap().len(), 3);
    assert_eq!(
        store.transactions(&EntryFilter::all().within(march)).unwrap().len(),
        2
    );
    let ana_march = store
        .transactions(&EntryFilter::all().member(f.ana).within(march))
        .unwrap();
    assert_eq!(ana_march.len(), 1);
    assert_eq!(ana_march[0].amount, dec!(10));
    let paid = store
        .transactions(&EntryFilter::all().status(Status::Paid))
        .unwrap();
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].date, date(2024, 4, 2));
    assert!(store
        .transactions(&EntryFilter::all().account(f.checking).category(f.food + 1000))
        .unwrap()
        .is_empty());
}

#[test]
fn status_changes_one_row_only() {
    let conn = setup();
    let mut store = SqliteStore::new(&conn);
    let f = fixture(&mut store);
    let group = InstallmentEngine::new(&mut store)
        .record_expense(&ExpenseDraft {
            type_id: f.installment,
            installments: Some(3),
            ..expense(&f, dec!(90), date(2024, 1, 10))
        })
        .unwrap();

    let updated = ledger::set_status(&mut store, group[1].id, Status::Paid).unwrap();
    assert_eq!(updated.status, Status::Paid);
    assert_eq!(updated.amount, group[1].amount);
    let pending = store
        .transactions(&EntryFilter::all().status(Status::Pending))
        .unwrap();
    assert_eq!(pending.len(), 2);

    let err = ledger::set_status(&mut store, 9999, Status::Paid).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn deleting_parent_keeps_siblings() {
    let conn = setup();
    let mut store = SqliteStore::new(&conn);
    let f = fixture(&mut store);
    let group = InstallmentEngine::new(&mut store)
        .record_expense(&ExpenseDraft {
            type_id: f.installment,
            installments: Some(4),
            ..expense(&f, dec!(400), date(2024, 1, 10))
        })
        .unwrap();
    let parent = group[0].id;

    ledger::remove_transaction(&mut store, parent).unwrap();
    let left = store.transactions(&EntryFilter::all()).unwrap();
    assert_eq!(left.len(), 3);
    assert!(left.iter().all(|t| t.parent_transaction_id == Some(parent)));

    let err = ledger::remove_transaction(&mut store, parent).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { entity: "transaction", .. }));
}

#[test]
fn income_is_validated_and_removable() {
    let conn = setup();
    let mut store = SqliteStore::new(&conn);
    let f = fixture(&mut store);
    let new = NewMovement {
        description: " Salary ".into(),
        amount: dec!(3000),
        date: date(2024, 1, 5),
        account_id: Some(f.checking),
        member_id: Some(f.ana),
        category_id: None,
        type_id: None,
        aggregate_to_family: None,
    };
    let movement = ledger::record_income(&mut store, &new).unwrap();
    assert_eq!(movement.description, "Salary");

    let wrong_kind = NewMovement {
        category_id: Some(f.food),
        ..new.clone()
    };
    assert!(matches!(
        ledger::record_income(&mut store, &wrong_kind),
        Err(LedgerError::Validation(_))
    ));

    ledger::remove_movement(&mut store, movement.id).unwrap();
    assert!(store.movements(&EntryFilter::all()).unwrap().is_empty());
    assert!(ledger::remove_movement(&mut store, movement.id)
        .unwrap_err()
        .is_not_found());
}

#[test]
fn oversized_income_is_rejected_before_insert() {
    let conn = setup();
    let mut store = SqliteStore::new(&conn);
    let f = fixture(&mut store);
    let new = NewMovement {
        description: "Windfall".into(),
        amount: dec!(50000000000000000000000000000),
        date: date(2024, 1, 5),
        account_id: Some(f.checking),
        member_id: Some(f.ana),
        category_id: None,
        type_id: None,
        aggregate_to_family: None,
    };
    for _ in 0..2 {
        assert!(matches!(
            ledger::record_income(&mut store, &new),
            Err(LedgerError::Validation(_))
        ));
    }
    let movements = store.movements(&EntryFilter::all()).unwrap();
    assert!(movements.is_empty());

    let limit = NewMovement {
        amount: ledger::MAX_AMOUNT,
        ..new.clone()
    };
    ledger::record_income(&mut store, &limit).unwrap();
    ledger::record_income(&mut store, &limit).unwrap();
    let movements = store.movements(&EntryFilter::all()).unwrap();
    let totals = period_totals(&movements, &[], Period::month(2024, 1).unwrap());
    assert_eq!(totals.total_income, dec!(19999999999.98));
}

#[test]
fn opening_balance_needs_cents_and_fits_the_limit() {
    let conn = setup();
    let mut store = SqliteStore::new(&conn);
    let account = |name: &str, initial_balance| NewAccount {
        name: name.into(),
        kind: AccountKind::Credit,
        initial_balance,
    };
    for bad in [dec!(10.123), dec!(10000000000.00), dec!(-10000000000.00)] {
        assert!(matches!(
            ledger::open_account(&mut store, &account("Card", bad)),
            Err(LedgerError::Validation(_))
        ));
    }
    assert!(store.accounts().unwrap().is_empty());

    let card = ledger::open_account(&mut store, &account("Card", dec!(-150.00))).unwrap();
    assert_eq!(card.initial_balance, dec!(-150.00));
}

#[test]
fn budget_amounts_are_validated() {
    let conn = setup();
    let mut store = SqliteStore::new(&conn);
    let f = fixture(&mut store);
    for bad in [dec!(0), dec!(12.345), dec!(10000000000.00)] {
        assert!(matches!(
            ledger::set_budget(&mut store, 2024, 3, f.food, bad),
            Err(LedgerError::Validation(_))
        ));
    }
    assert!(store.all_budgets().unwrap().is_empty());
    ledger::set_budget(&mut store, 2024, 3, f.food, dec!(250)).unwrap();
    assert_eq!(store.budgets(2024, 3).unwrap()[0].amount, dec!(250));
}

#[test]
fn oversized_amount_in_storage_is_rejected_on_read() {
    let conn = setup();
    let mut store = SqliteStore::new(&conn);
    let f = fixture(&mut store);
    conn.execute(
        "INSERT INTO movements(description, amount, date, member_id)
         VALUES ('bad', '50000000000000000000000000000', '2024-01-01', ?1)",
        params![f.ana],
    )
    .unwrap();
    let err = store.movements(&EntryFilter::all()).unwrap_err();
    assert!(matches!(err, LedgerError::Persistence(_)));
}

#[test]
fn negative_amount_in_storage_is_rejected_on_read() {
    let conn = setup();
    let mut store = SqliteStore::new(&conn);
    let f = fixture(&mut store);
    conn.execute(
        "INSERT INTO transactions(description, amount, date, member_id, category_id, type_id)
         VALUES ('bad', '-5.00', '2024-01-01', ?1, ?2, ?3)",
        params![f.ana, f.food, f.fixed],
    )
    .unwrap();
    let err = store.transactions(&EntryFilter::all()).unwrap_err();
    assert!(matches!(err, LedgerError::Persistence(_)));
}

#[test]
fn budgets_upsert_per_month_and_category() {
    let conn = setup();
    let mut store = SqliteStore::new(&conn);
    let f = fixture(&mut store);
    store.upsert_budget(2024, 3, f.food, dec!(200)).unwrap();
    let updated = store.upsert_budget(2024, 3, f.food, dec!(250)).unwrap();
    assert_eq!(updated.amount, dec!(250));
    store.upsert_budget(2024, 4, f.food, dec!(300)).unwrap();

    let march = store.budgets(2024, 3).unwrap();
    assert_eq!(march.len(), 1);
    assert_eq!(march[0].amount, dec!(250));

    let all = store.all_budgets().unwrap();
    assert_eq!(
        all.iter().map(|b| (b.month, b.amount)).collect::<Vec<_>>(),
        vec![(4, dec!(300)), (3, dec!(250))]
    );
}

#[test]
fn member_aggregate_toggle() {
    let conn = setup();
    let mut store = SqliteStore::new(&conn);
    let f = fixture(&mut store);
    let m = store.set_member_aggregate(f.bruno, true).unwrap();
    assert!(m.aggregate_to_family);
    assert!(store.set_member_aggregate(4242, true).unwrap_err().is_not_found());
}

#[test]
fn on_disk_database_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");
    {
        let mut conn = db::open_or_init(Some(path.as_path())).unwrap();
        db::seed_defaults(&mut conn).unwrap();
        let mut store = SqliteStore::new(&conn);
        fixture(&mut store);
    }
    let conn = db::open_or_init(Some(path.as_path())).unwrap();
    let store = SqliteStore::new(&conn);
    assert_eq!(store.accounts().unwrap().len(), 1);
    assert_eq!(store.members().unwrap().len(), 2);
}
