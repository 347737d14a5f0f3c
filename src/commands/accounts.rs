// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::Snapshot;
use crate::ledger;
use crate::models::{AccountKind, NewAccount};
use crate::store::{EntryFilter, SqliteStore};
use crate::utils::{arg_str, get_currency, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = arg_str(sub, "name")?.trim();
    let kind: AccountKind = arg_str(sub, "kind")?.parse()?;
    let initial_balance = parse_decimal(arg_str(sub, "initial")?)?;

    let mut store = SqliteStore::new(conn);
    let account = ledger::open_account(
        &mut store,
        &NewAccount {
            name: name.to_string(),
            kind,
            initial_balance,
        },
    )
    .with_context(|| format!("Could not add account '{}'", name))?;
    println!(
        "Added account '{}' ({}, opening {:.2})",
        account.name, account.kind, account.initial_balance
    );
    Ok(())
}

#[derive(Serialize)]
pub struct BalanceRow {
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance: Decimal,
    pub balance: Decimal,
}

/// Every account with its balance recomputed from the full history.
pub fn balance_rows(conn: &Connection) -> Result<Vec<BalanceRow>> {
    let store = SqliteStore::new(conn);
    let snapshot = Snapshot::load(&store, &EntryFilter::all())?;
    Ok(snapshot
        .balances()
        .into_iter()
        .map(|(a, balance)| BalanceRow {
            name: a.name,
            kind: a.kind,
            initial_balance: a.initial_balance,
            balance,
        })
        .collect())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = balance_rows(conn)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let ccy = get_currency(conn)?;
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    r.kind.to_string(),
                    format!("{:.2}", r.initial_balance),
                    format!("{:.2}", r.balance),
                ]
            })
            .collect();
        let hdr = format!("Balance ({})", ccy);
        println!(
            "{}",
            pretty_table(&["Name", "Kind", "Opening", &hdr], rows)
        );
    }
    Ok(())
}
