// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use hearth::commands::{accounts, budgets, config, doctor, income, members, transactions};
use hearth::{cli, db, utils};
use rusqlite::Connection;
use rust_decimal_macros::dec;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    db::seed_defaults(&mut conn).unwrap();
    run(&conn, &["hearth", "member", "add", "Ana"]);
    run(&conn, &["hearth", "member", "add", "Bruno", "--no-family"]);
    run(
        &conn,
        &["hearth", "account", "add", "Nubank", "--kind", "credit", "--initial", "-150.00"],
    );
    conn
}

/// Dispatches one command line the way `main` does.
fn run(conn: &Connection, args: &[&str]) {
    let matches = cli::build_cli().get_matches_from(args);
    match matches.subcommand() {
        Some(("account", sub)) => accounts::handle(conn, sub).unwrap(),
        Some(("member", sub)) => members::handle(conn, sub).unwrap(),
        Some(("income", sub)) => income::handle(conn, sub).unwrap(),
        Some(("expense", sub)) => transactions::handle(conn, sub).unwrap(),
        Some(("config", sub)) => config::handle(conn, sub).unwrap(),
        Some(("budget", sub)) => budgets::handle(conn, sub).unwrap(),
        other => panic!("unexpected subcommand {:?}", other.map(|(n, _)| n)),
    }
}

fn sub_matches(args: &[&str]) -> clap::ArgMatches {
    let matches = cli::build_cli().get_matches_from(args);
    let (_, group) = matches.subcommand().expect("group");
    let (_, leaf) = group.subcommand().expect("leaf");
    leaf.clone()
}

#[test]
fn global_flags_parse_anywhere() {
    let matches =
        cli::build_cli().get_matches_from(["hearth", "report", "summary", "--db", "x.sqlite", "-vv"]);
    assert_eq!(matches.get_one::<String>("db").unwrap(), "x.sqlite");
    assert_eq!(matches.get_count("verbose"), 2);
}

#[test]
fn expense_add_expands_installments() {
    let conn = setup();
    let add = sub_matches(&[
        "hearth", "expense", "add", "Fridge", "--amount", "2500.00", "--member", "Ana",
        "--category", "Housing", "--type", "Installment", "--installments", "10", "--date",
        "2024-01-31", "--account", "Nubank",
    ]);
    let rows = transactions::add_expense(&conn, &add).unwrap();
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().all(|r| r.amount == dec!(250.00)));
    assert_eq!(rows[1].date.to_string(), "2024-02-29");

    let list = sub_matches(&["hearth", "expense", "list", "--month", "2024-02"]);
    let feb = transactions::query_rows(&conn, &list).unwrap();
    assert_eq!(feb.len(), 1);
    assert_eq!(feb[0].installment_number, Some(2));

    let all = sub_matches(&["hearth", "expense", "list", "--all", "--status", "pending"]);
    assert_eq!(transactions::query_rows(&conn, &all).unwrap().len(), 10);
}

#[test]
fn expense_add_rejects_installments_on_plain_type() {
    let conn = setup();
    let add = sub_matches(&[
        "hearth", "expense", "add", "Gym", "--amount", "90", "--member", "Ana", "--category",
        "Health", "--type", "Fixed", "--installments", "3",
    ]);
    let err = transactions::add_expense(&conn, &add).unwrap_err();
    assert!(err.to_string().contains("Gym"));
    let all = sub_matches(&["hearth", "expense", "list", "--all"]);
    assert!(transactions::query_rows(&conn, &all).unwrap().is_empty());
}

#[test]
fn account_balance_follows_entries() {
    let conn = setup();
    run(
        &conn,
        &[
            "hearth", "income", "add", "Refund", "--amount", "50", "--account", "Nubank",
            "--date", "2024-03-01",
        ],
    );
    run(
        &conn,
        &[
            "hearth", "expense", "add", "Market", "--amount", "30.25", "--member", "Bruno",
            "--category", "Groceries", "--type", "One-time", "--account", "Nubank", "--date",
            "2024-03-02",
        ],
    );
    let rows = accounts::balance_rows(&conn).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].balance, dec!(-130.25));

    let list = sub_matches(&["hearth", "income", "list", "--month", "2024-03"]);
    assert_eq!(income::query_rows(&conn, &list).unwrap().len(), 1);
}

#[test]
fn status_command_marks_paid() {
    let conn = setup();
    run(
        &conn,
        &[
            "hearth", "expense", "add", "Rent", "--amount", "1200", "--member", "Ana",
            "--category", "Housing", "--type", "Fixed", "--date", "2024-03-05",
        ],
    );
    let all = sub_matches(&["hearth", "expense", "list", "--all"]);
    let id = transactions::query_rows(&conn, &all).unwrap()[0].id.to_string();
    run(&conn, &["hearth", "expense", "status", &id, "paid"]);

    let paid = sub_matches(&["hearth", "expense", "list", "--all", "--status", "paid"]);
    assert_eq!(transactions::query_rows(&conn, &paid).unwrap().len(), 1);
}

#[test]
fn doctor_reports_orphaned_installments() {
    let conn = setup();
    assert!(doctor::check(&conn).unwrap().is_empty());

    let add = sub_matches(&[
        "hearth", "expense", "add", "TV", "--amount", "900", "--member", "Ana", "--category",
        "Leisure", "--type", "Installment", "-n", "3",
    ]);
    let rows = transactions::add_expense(&conn, &add).unwrap();
    run(&conn, &["hearth", "expense", "rm", &rows[0].id.to_string()]);

    let issues = doctor::check(&conn).unwrap();
    assert_eq!(
        issues.iter().filter(|(i, _)| i == "orphan_installment").count(),
        2
    );
    assert!(issues.iter().any(|(i, _)| i == "incomplete_group"));
}

#[test]
fn config_sets_display_currency() {
    let conn = setup();
    assert_eq!(utils::get_currency(&conn).unwrap(), "BRL");
    run(&conn, &["hearth", "config", "set", "currency", "usd"]);
    assert_eq!(utils::get_currency(&conn).unwrap(), "USD");
}

#[test]
fn account_add_rejects_sub_cent_opening_balance() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "hearth", "account", "add", "Wallet", "--kind", "cash", "--initial", "10.123",
    ]);
    let (_, sub) = matches.subcommand().unwrap();
    assert!(accounts::handle(&conn, sub).is_err());
    assert_eq!(accounts::balance_rows(&conn).unwrap().len(), 1);
}

#[test]
fn budget_list_returns_budget_rows() {
    let conn = setup();
    run(&conn, &["hearth", "budget", "set", "2024-03", "Groceries", "600"]);
    run(&conn, &["hearth", "budget", "set", "2024-04", "Groceries", "650.50"]);

    let all = budgets::list_rows(&conn, &sub_matches(&["hearth", "budget", "list"])).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!((all[0].year, all[0].month), (2024, 4));
    assert_eq!(all[0].amount, dec!(650.50));

    let march = sub_matches(&["hearth", "budget", "list", "--month", "2024-03"]);
    let rows = budgets::list_rows(&conn, &march).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, dec!(600));
}
