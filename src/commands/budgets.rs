// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::{self, Snapshot};
use crate::ledger;
use crate::models::{Budget, EntryKind, Period};
use crate::store::{EntryFilter, LedgerStore, SqliteStore};
use crate::utils::{
    arg_str, id_for_category, maybe_print_json, parse_decimal, parse_month, pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("report", sub)) => report(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (year, month) = parse_month(arg_str(sub, "month")?)?;
    let cat = arg_str(sub, "category")?;
    let amount = parse_decimal(arg_str(sub, "amount")?)?;
    let cat_id = id_for_category(conn, cat, EntryKind::Expense)?;
    let budget = ledger::set_budget(&mut SqliteStore::new(conn), year, month, cat_id, amount)?;
    println!(
        "Budget set for {}-{:02} / {} = {:.2}",
        budget.year, budget.month, cat, budget.amount
    );
    Ok(())
}

/// Budgets for `--month`, or every month when it is absent.
pub fn list_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Budget>> {
    let store = SqliteStore::new(conn);
    let rows = match sub.get_one::<String>("month") {
        Some(m) => {
            let (year, month) = parse_month(m)?;
            store.budgets(year, month)?
        }
        None => store.all_budgets()?,
    };
    Ok(rows)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = list_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let names: HashMap<i64, String> = SqliteStore::new(conn)
            .categories(Some(EntryKind::Expense))?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        let rows = data
            .iter()
            .map(|b| {
                vec![
                    format!("{:04}-{:02}", b.year, b.month),
                    names
                        .get(&b.category_id)
                        .cloned()
                        .unwrap_or_else(|| format!("#{}", b.category_id)),
                    format!("{:.2}", b.amount),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "Category", "Budget"], rows));
    }
    Ok(())
}

fn report(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (year, month) = parse_month(arg_str(sub, "month")?)?;
    let store = SqliteStore::new(conn);
    let snap = Snapshot::load(&store, &EntryFilter::all().within(Period::month(year, month)?))?;
    let budgets = store.budgets(year, month)?;
    let data = aggregate::budget_report(&budgets, &snap.transactions, &snap.categories, year, month);

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|l| {
                vec![
                    l.category.clone(),
                    format!("{:.2}", l.budget),
                    format!("{:.2}", l.spent),
                    format!("{:.2}", l.remaining),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Budget", "Spent", "Remaining"], rows)
        );
    }
    Ok(())
}
